//! Client for a Chroma server, the external vector store.
//!
//! Records persist in the store beyond the process lifetime until
//! `remove_all` is called. Queries convert cosine distance to similarity
//! (`1 - distance`) and drop hits below the caller's threshold, so no
//! returned match is ever scored under it.

use crate::error::StoreError;
use crate::traits::{ScoredChunk, VectorStore};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BACKEND: &str = "chroma";

pub struct ChromaStore {
    endpoint: String,
    collection: String,
    client: Client,
}

impl ChromaStore {
    pub fn new(endpoint: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            collection: collection.into(),
            client: Client::new(),
        }
    }

    /// Resolves the store-assigned collection id, creating the collection on
    /// first use. Cosine space, matching the similarity threshold semantics.
    async fn collection_id(&self) -> Result<String, StoreError> {
        let response = self
            .client
            .post(format!("{}/api/v1/collections", self.endpoint))
            .json(&json!({
                "name": self.collection,
                "get_or_create": true,
                "metadata": { "hnsw:space": "cosine" },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::BackendResponse {
                backend: BACKEND.to_string(),
                details: "collection response carried no id".to_string(),
            })
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn ensure_collection(&self) -> Result<(), StoreError> {
        self.collection_id().await.map(|_| ())
    }

    async fn remove_all(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(format!(
                "{}/api/v1/collections/{}",
                self.endpoint, self.collection
            ))
            .send()
            .await?;

        // A collection that never existed counts as cleared.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }

        Err(StoreError::BackendResponse {
            backend: BACKEND.to_string(),
            details: response.status().to_string(),
        })
    }

    async fn add_all(&self, embeddings: &[Vec<f32>], texts: &[String]) -> Result<(), StoreError> {
        if embeddings.len() != texts.len() {
            return Err(StoreError::Request(format!(
                "embedding count {} doesn't match text count {}",
                embeddings.len(),
                texts.len()
            )));
        }

        if embeddings.is_empty() {
            return Ok(());
        }

        let collection_id = self.collection_id().await?;
        let ids = texts
            .iter()
            .map(|_| Uuid::new_v4().to_string())
            .collect::<Vec<_>>();

        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/add",
                self.endpoint, collection_id
            ))
            .json(&json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": texts,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        max_results: usize,
        min_score: f64,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let collection_id = self.collection_id().await?;

        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.endpoint, collection_id
            ))
            .json(&json!({
                "query_embeddings": [embedding],
                "n_results": max_results,
                "include": ["documents", "distances"],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        hits_from_response(&parsed, min_score)
    }
}

/// Walks the query response's parallel arrays (first query only — we always
/// send exactly one) into scored chunks, applying the similarity threshold.
fn hits_from_response(parsed: &Value, min_score: f64) -> Result<Vec<ScoredChunk>, StoreError> {
    let documents = parsed
        .pointer("/documents/0")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::BackendResponse {
            backend: BACKEND.to_string(),
            details: "query response carried no documents".to_string(),
        })?;

    let distances = parsed
        .pointer("/distances/0")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::BackendResponse {
            backend: BACKEND.to_string(),
            details: "query response carried no distances".to_string(),
        })?;

    let mut hits = Vec::new();
    for (document, distance) in documents.iter().zip(distances.iter()) {
        let text = document.as_str().unwrap_or_default().to_string();
        let distance = distance.as_f64().unwrap_or(f64::MAX);
        let score = 1.0 - distance;

        if score >= min_score {
            hits.push(ScoredChunk { text, score });
        }
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::hits_from_response;
    use serde_json::json;

    #[test]
    fn hits_below_the_threshold_are_dropped() {
        let response = json!({
            "ids": [["a", "b", "c"]],
            "documents": [["close match", "borderline", "distant"]],
            "distances": [[0.1, 0.3, 0.9]],
        });

        let hits = hits_from_response(&response, 0.7).expect("response parses");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "close match");
        assert!((hits[0].score - 0.9).abs() < 1e-9);
        assert!(hits.iter().all(|hit| hit.score >= 0.7));
    }

    #[test]
    fn empty_result_set_is_not_an_error() {
        let response = json!({
            "ids": [[]],
            "documents": [[]],
            "distances": [[]],
        });

        let hits = hits_from_response(&response, 0.7).expect("response parses");
        assert!(hits.is_empty());
    }

    #[test]
    fn malformed_response_is_a_backend_error() {
        let response = json!({ "unexpected": true });
        assert!(hits_from_response(&response, 0.7).is_err());
    }
}
