//! Conversation state for the chat client.
//!
//! A conversation is an explicit value owned by the caller rather than a
//! hidden field on the client, so independent conversations can coexist.
//! After each exchange the carried state is the response's candidate list,
//! replaced wholesale: exactly one level of turn history is replayed into
//! the next request.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// One chat exchange's result: the reply text plus the full candidate list
/// that becomes the next conversation state.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub candidates: Vec<Message>,
}

/// An ordered, append-only message sequence held in process memory for the
/// session. Dropped on exit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state carried forward after an exchange: the response candidates,
    /// replacing whatever was held before.
    pub fn from_candidates(candidates: Vec<Message>) -> Self {
        Self {
            messages: candidates,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The message list for the next request: the replayed history followed
    /// by a new user message.
    pub fn with_user_message(&self, text: &str) -> Vec<Message> {
        let mut messages = self.messages.clone();
        messages.push(Message::user(text));
        messages
    }
}
