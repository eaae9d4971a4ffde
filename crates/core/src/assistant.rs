//! The assistant pipeline: ingestion on one side, retrieval-augmented
//! question answering on the other.
//!
//! Everything is sequential: each embedding, store call, and chat exchange
//! is awaited to completion before the next begins.

use crate::chat::Conversation;
use crate::config::{ChunkingOptions, PromptTemplate, RetrievalOptions};
use crate::error::AssistError;
use crate::ingest::{chunk_pdf_folder, IngestionReport};
use crate::traits::{ChatBackend, Embedder, VectorStore};
use std::path::Path;

pub struct Assistant<E, C, S>
where
    E: Embedder,
    C: ChatBackend,
    S: VectorStore,
{
    embedder: E,
    chat: C,
    store: S,
    template: PromptTemplate,
    retrieval: RetrievalOptions,
    chunking: ChunkingOptions,
}

/// A rendered prompt ready to send, echoed to the user before the exchange.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub text: String,
    pub matches: usize,
}

/// The outcome of one exchange.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub conversation: Conversation,
}

impl<E, C, S> Assistant<E, C, S>
where
    E: Embedder + Send + Sync,
    C: ChatBackend + Send + Sync,
    S: VectorStore + Send + Sync,
{
    pub fn new(
        embedder: E,
        chat: C,
        store: S,
        template: PromptTemplate,
        retrieval: RetrievalOptions,
        chunking: ChunkingOptions,
    ) -> Self {
        Self {
            embedder,
            chat,
            store,
            template,
            retrieval,
            chunking,
        }
    }

    /// Clears every stored record. Without this, re-ingestion appends
    /// duplicates.
    pub async fn clear_vector_store(&self) -> Result<(), AssistError> {
        self.store.remove_all().await?;
        Ok(())
    }

    /// Ingests every PDF directly inside `folder`: extract, split, embed
    /// each chunk sequentially, then write all pairs in one bulk call.
    pub async fn build_vector_store(
        &self,
        folder: &Path,
    ) -> Result<IngestionReport, AssistError> {
        let report = chunk_pdf_folder(folder, &self.chunking)?;
        self.index_chunks(&report.chunks).await?;
        Ok(report)
    }

    pub async fn index_chunks(&self, chunks: &[String]) -> Result<(), AssistError> {
        self.store.ensure_collection().await?;

        let mut embeddings = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            embeddings.push(self.embedder.embed(chunk).await?);
        }

        self.store.add_all(&embeddings, chunks).await?;
        Ok(())
    }

    /// Embeds the question, retrieves the most similar chunks, and fills
    /// the prompt template. Zero matches yields an empty context, not an
    /// error — the model still gets a prompt, just without retrieved
    /// context.
    pub async fn compose_prompt(&self, question: &str) -> Result<ComposedPrompt, AssistError> {
        let query_embedding = self.embedder.embed(question).await?;
        let hits = self
            .store
            .query(
                &query_embedding,
                self.retrieval.max_results,
                self.retrieval.min_score,
            )
            .await?;

        let context = hits
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(ComposedPrompt {
            text: self.template.render(question, &context),
            matches: hits.len(),
        })
    }

    /// Sends the prompt on top of the conversation's replayed history and
    /// returns the reply together with the next conversation state.
    pub async fn send(
        &self,
        conversation: Conversation,
        prompt: &str,
    ) -> Result<Answer, AssistError> {
        let messages = conversation.with_user_message(prompt);
        let reply = self.chat.chat(&messages).await?;

        Ok(Answer {
            text: reply.text,
            conversation: Conversation::from_candidates(reply.candidates),
        })
    }

    /// One full retrieve-and-chat turn.
    pub async fn answer(
        &self,
        conversation: Conversation,
        question: &str,
    ) -> Result<(ComposedPrompt, Answer), AssistError> {
        let prompt = self.compose_prompt(question).await?;
        let answer = self.send(conversation, &prompt.text).await?;
        Ok((prompt, answer))
    }
}

#[cfg(test)]
mod tests {
    use super::Assistant;
    use crate::chat::{ChatReply, Conversation, Message, Role};
    use crate::config::{ChunkingOptions, PromptTemplate, RetrievalOptions};
    use crate::error::{InferenceError, StoreError};
    use crate::traits::{ChatBackend, Embedder, ScoredChunk, VectorStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeEmbedder {
        dimensions: usize,
        calls: Mutex<Vec<String>>,
    }

    impl FakeEmbedder {
        fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
            self.calls.lock().unwrap().push(text.to_string());
            // deterministic: same input, same vector
            let seed = text.len() as f32;
            Ok((0..self.dimensions).map(|i| seed + i as f32).collect())
        }
    }

    struct FakeChat {
        reply: ChatReply,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl FakeChat {
        fn new(reply: ChatReply) -> Self {
            Self {
                reply,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for FakeChat {
        async fn chat(&self, messages: &[Message]) -> Result<ChatReply, InferenceError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            Ok(self.reply.clone())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        hits: Vec<ScoredChunk>,
        added: Mutex<Vec<(usize, usize)>>,
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn ensure_collection(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn remove_all(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn add_all(
            &self,
            embeddings: &[Vec<f32>],
            texts: &[String],
        ) -> Result<(), StoreError> {
            self.added
                .lock()
                .unwrap()
                .push((embeddings.len(), texts.len()));
            Ok(())
        }

        async fn query(
            &self,
            _embedding: &[f32],
            max_results: usize,
            min_score: f64,
        ) -> Result<Vec<ScoredChunk>, StoreError> {
            Ok(self
                .hits
                .iter()
                .filter(|hit| hit.score >= min_score)
                .take(max_results)
                .cloned()
                .collect())
        }
    }

    fn assistant(
        store: FakeStore,
        reply: ChatReply,
    ) -> Assistant<FakeEmbedder, FakeChat, FakeStore> {
        Assistant::new(
            FakeEmbedder::new(4),
            FakeChat::new(reply),
            store,
            PromptTemplate::new("C: {context} Q: {question}"),
            RetrievalOptions::default(),
            ChunkingOptions::default(),
        )
    }

    fn reply(text: &str) -> ChatReply {
        ChatReply {
            text: text.to_string(),
            candidates: vec![Message::assistant(text)],
        }
    }

    #[tokio::test]
    async fn context_is_joined_with_blank_lines() {
        let store = FakeStore {
            hits: vec![
                ScoredChunk {
                    text: "chunk one".to_string(),
                    score: 0.9,
                },
                ScoredChunk {
                    text: "chunk two".to_string(),
                    score: 0.8,
                },
            ],
            ..Default::default()
        };
        let assistant = assistant(store, reply("answer"));

        let prompt = assistant.compose_prompt("why?").await.unwrap();

        assert_eq!(prompt.matches, 2);
        assert_eq!(prompt.text, "C: chunk one\n\nchunk two Q: why?");
    }

    #[tokio::test]
    async fn zero_matches_still_renders_a_prompt() {
        let assistant = assistant(FakeStore::default(), reply("answer"));

        let prompt = assistant.compose_prompt("why?").await.unwrap();

        assert_eq!(prompt.matches, 0);
        assert_eq!(prompt.text, "C:  Q: why?");
    }

    #[tokio::test]
    async fn conversation_after_exchange_is_exactly_the_candidate_list() {
        let candidates = vec![
            Message::assistant("first candidate"),
            Message::assistant("second candidate"),
        ];
        let assistant = assistant(
            FakeStore::default(),
            ChatReply {
                text: "second candidate".to_string(),
                candidates: candidates.clone(),
            },
        );

        let before = Conversation::from_candidates(vec![Message::assistant("stale")]);
        let answer = assistant.send(before, "prompt").await.unwrap();

        assert_eq!(answer.conversation.messages(), candidates.as_slice());
    }

    #[tokio::test]
    async fn replayed_history_is_one_level_deep() {
        let assistant = assistant(FakeStore::default(), reply("use jcmd"));

        let first = assistant.send(Conversation::new(), "q1").await.unwrap();
        let _second = assistant.send(first.conversation, "q2").await.unwrap();

        let requests = assistant.chat.requests.lock().unwrap();
        assert_eq!(requests[0].len(), 1);
        // second request: previous candidates + the new user message, nothing else
        assert_eq!(requests[1].len(), 2);
        assert_eq!(requests[1][0].role, Role::Assistant);
        assert_eq!(requests[1][0].text, "use jcmd");
        assert_eq!(requests[1][1].role, Role::User);
        assert_eq!(requests[1][1].text, "q2");
    }

    #[tokio::test]
    async fn indexing_embeds_every_chunk_and_writes_once() {
        let assistant = assistant(FakeStore::default(), reply("unused"));
        let chunks = vec![
            "heap tuning".to_string(),
            "thread dumps".to_string(),
            "class loading".to_string(),
        ];

        assistant.index_chunks(&chunks).await.unwrap();

        let embed_calls = assistant.embedder.calls.lock().unwrap();
        assert_eq!(embed_calls.len(), 3);

        let added = assistant.store.added.lock().unwrap();
        assert_eq!(added.as_slice(), &[(3, 3)]);
    }

    #[tokio::test]
    async fn retrieval_respects_threshold_and_limit() {
        let hits = (0..20)
            .map(|n| ScoredChunk {
                text: format!("chunk {n}"),
                score: 1.0 - n as f64 * 0.05,
            })
            .collect();
        let store = FakeStore {
            hits,
            ..Default::default()
        };
        let assistant = assistant(store, reply("answer"));

        let prompt = assistant.compose_prompt("question").await.unwrap();

        // 0.7 threshold keeps 7 of the 20, under the max of 10
        assert_eq!(prompt.matches, 7);
    }
}
