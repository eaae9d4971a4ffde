use crate::chat::{ChatReply, Message};
use crate::error::{InferenceError, StoreError};
use async_trait::async_trait;

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f64,
}

#[async_trait]
pub trait Embedder {
    /// Embeds one non-empty text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, InferenceError>;
}

#[async_trait]
pub trait ChatBackend {
    /// Sends the full message list and returns the generated reply.
    async fn chat(&self, messages: &[Message]) -> Result<ChatReply, InferenceError>;
}

#[async_trait]
pub trait VectorStore {
    async fn ensure_collection(&self) -> Result<(), StoreError>;

    /// Clears every stored record. Used as the optional precondition before
    /// re-ingesting, since ingestion otherwise appends duplicates.
    async fn remove_all(&self) -> Result<(), StoreError>;

    /// Writes all (embedding, text) pairs in one bulk call.
    async fn add_all(&self, embeddings: &[Vec<f32>], texts: &[String]) -> Result<(), StoreError>;

    /// Nearest-neighbor search: at most `max_results` hits, none scored
    /// below `min_score`.
    async fn query(
        &self,
        embedding: &[f32],
        max_results: usize,
        min_score: f64,
    ) -> Result<Vec<ScoredChunk>, StoreError>;
}
