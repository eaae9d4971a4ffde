//! Client for the hosted Generative AI inference endpoint.
//!
//! One `GenAiClient` serves both operations: `embedText` for embeddings and
//! `chat` for completions. Requests are issued one at a time and block the
//! caller until the round trip completes; a single read timeout applies to
//! the underlying transport. There is no retry and no fallback — transport
//! and shape errors are fatal to the exchange.

use crate::chat::{ChatReply, Message, Role};
use crate::config::{GenAiEnv, GenerationParams, CHAT_MODEL_ID, EMBEDDING_MODEL_ID};
use crate::credentials::{load_session_auth, SessionAuth};
use crate::error::InferenceError;
use crate::traits::{ChatBackend, Embedder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

const API_VERSION: &str = "20231130";

#[derive(Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    endpoint: Url,
    compartment_id: String,
    auth: SessionAuth,
    params: GenerationParams,
}

impl GenAiClient {
    /// Builds the client: loads credentials, validates the endpoint, and
    /// configures the transport. Credential failures are fatal here, before
    /// any request is made.
    pub fn new(env: &GenAiEnv, params: GenerationParams) -> Result<Self, InferenceError> {
        let auth = load_session_auth(&env.config_location, &env.config_profile)?;
        let endpoint = Url::parse(&env.endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(env.read_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            compartment_id: env.compartment_id.clone(),
            auth,
            params,
        })
    }

    async fn post_action<B: Serialize>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<Value, InferenceError> {
        let url = self
            .endpoint
            .join(&format!("/{API_VERSION}/actions/{action}"))?;

        let response = self
            .http
            .post(url)
            .bearer_auth(self.auth.bearer_token())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(InferenceError::BackendStatus {
                status: status.to_string(),
                details,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Embedder for GenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        if text.trim().is_empty() {
            return Err(InferenceError::InvalidArgument(
                "embedding input must be non-empty".to_string(),
            ));
        }

        let details = EmbedTextDetails {
            inputs: vec![text],
            serving_mode: ServingMode::on_demand(EMBEDDING_MODEL_ID),
            compartment_id: &self.compartment_id,
            truncate: "NONE",
        };

        let value = self.post_action("embedText", &details).await?;
        let result: EmbedTextResult = serde_json::from_value(value).map_err(|error| {
            InferenceError::UnexpectedResponse(format!("embed response: {error}"))
        })?;

        result.embeddings.into_iter().next().ok_or_else(|| {
            InferenceError::UnexpectedResponse("embed response carried no vectors".to_string())
        })
    }
}

#[async_trait]
impl ChatBackend for GenAiClient {
    async fn chat(&self, messages: &[Message]) -> Result<ChatReply, InferenceError> {
        let details = ChatDetails {
            compartment_id: &self.compartment_id,
            serving_mode: ServingMode::on_demand(CHAT_MODEL_ID),
            chat_request: GenericChatRequest {
                api_format: "GENERIC",
                messages: messages.iter().map(WireMessage::from).collect(),
                max_tokens: self.params.max_tokens,
                num_generations: self.params.num_generations,
                frequency_penalty: self.params.frequency_penalty,
                top_p: self.params.top_p,
                top_k: self.params.top_k,
                temperature: self.params.temperature,
                is_stream: self.params.is_stream,
            },
        };

        let value = self.post_action("chat", &details).await?;
        let result: ChatResult = serde_json::from_value(value).map_err(|error| {
            InferenceError::UnexpectedResponse(format!("chat response: {error}"))
        })?;

        reply_from_response(result.chat_response)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServingMode {
    serving_type: &'static str,
    model_id: &'static str,
}

impl ServingMode {
    fn on_demand(model_id: &'static str) -> Self {
        Self {
            serving_type: "ON_DEMAND",
            model_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedTextDetails<'a> {
    inputs: Vec<&'a str>,
    serving_mode: ServingMode,
    compartment_id: &'a str,
    truncate: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbedTextResult {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatDetails<'a> {
    compartment_id: &'a str,
    serving_mode: ServingMode,
    chat_request: GenericChatRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenericChatRequest {
    api_format: &'static str,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    num_generations: u32,
    frequency_penalty: f64,
    top_p: f64,
    top_k: i32,
    temperature: f64,
    is_stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    content: Vec<ChatContent>,
}

impl WireMessage {
    /// The text of the last content part, per the endpoint's convention that
    /// the final part holds the generated text.
    fn last_text(&self) -> Option<&str> {
        self.content.last().map(|part| match part {
            ChatContent::Text { text } => text.as_str(),
        })
    }

    fn to_message(&self) -> Option<Message> {
        self.last_text().map(|text| Message {
            role: self.role,
            text: text.to_string(),
        })
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: vec![ChatContent::Text {
                text: message.text.clone(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
enum ChatContent {
    Text { text: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatResult {
    chat_response: ChatApiResponse,
}

/// The known response encodings, discriminated by `apiFormat`. Anything
/// else decodes to `Unrecognized` and is reported as an explicit error
/// instead of an unchecked downcast.
#[derive(Debug, Deserialize)]
#[serde(tag = "apiFormat")]
enum ChatApiResponse {
    #[serde(rename = "GENERIC")]
    Generic(GenericChatResponse),
    #[serde(rename = "COHERE")]
    Cohere(CohereChatResponse),
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Deserialize)]
struct GenericChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct CohereChatResponse {
    text: String,
}

fn reply_from_response(response: ChatApiResponse) -> Result<ChatReply, InferenceError> {
    match response {
        ChatApiResponse::Generic(generic) => {
            let last = generic.choices.last().ok_or_else(|| {
                InferenceError::UnexpectedResponse(
                    "chat response carried no choices".to_string(),
                )
            })?;

            let text = last.message.last_text().ok_or_else(|| {
                InferenceError::UnexpectedResponse(
                    "chat choice carried no text content".to_string(),
                )
            })?;
            let text = text.to_string();

            let candidates = generic
                .choices
                .iter()
                .filter_map(|choice| choice.message.to_message())
                .collect();

            Ok(ChatReply { text, candidates })
        }
        ChatApiResponse::Cohere(cohere) => {
            let candidates = vec![Message::assistant(cohere.text.clone())];
            Ok(ChatReply {
                text: cohere.text,
                candidates,
            })
        }
        ChatApiResponse::Unrecognized => Err(InferenceError::UnexpectedResponse(
            "unrecognized chat response variant".to_string(),
        )),
    }
}
