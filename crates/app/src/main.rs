use chrono::Utc;
use clap::Parser;
use jvm_assist_core::config::{CHROMA_BASE_URL, CHROMA_COLLECTION, KNOWLEDGE_DOCS_DIR};
use jvm_assist_core::{
    Assistant, ChatBackend, ChromaStore, ChunkingOptions, Conversation, Embedder, GenAiClient,
    GenAiEnv, GenerationParams, PromptTemplate, RetrievalOptions, VectorStore,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "jvm-assist", version)]
struct Cli {
    /// Clear the vector store and re-ingest the knowledge folder before
    /// chatting. Pass this the first time the program is run.
    #[arg(long = "createVectorStore", default_value_t = false)]
    create_vector_store: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum LoopAction<'a> {
    Quit,
    Skip,
    Ask(&'a str),
}

/// What to do with one line of terminal input.
fn classify_input(line: &str) -> LoopAction<'_> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        LoopAction::Quit
    } else if trimmed.is_empty() {
        LoopAction::Skip
    } else {
        LoopAction::Ask(trimmed)
    }
}

/// The interactive loop: one question per line until "exit" or EOF. The
/// quit decision happens before any inference call is issued.
async fn run_loop<E, C, S>(
    assistant: &Assistant<E, C, S>,
    mut lines: impl Iterator<Item = io::Result<String>>,
) -> anyhow::Result<()>
where
    E: Embedder + Send + Sync,
    C: ChatBackend + Send + Sync,
    S: VectorStore + Send + Sync,
{
    let mut conversation = Conversation::new();

    loop {
        print!("Your question: ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            // EOF ends the session like "exit"
            None => break,
        };

        let question = match classify_input(&line) {
            LoopAction::Quit => break,
            LoopAction::Skip => continue,
            LoopAction::Ask(question) => question,
        };

        let prompt = assistant
            .compose_prompt(question)
            .await
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;
        println!("{}", prompt.text);

        let answer = assistant
            .send(conversation, &prompt.text)
            .await
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;

        println!("Answer: {}", answer.text);
        conversation = answer.conversation;
    }

    println!("Goodbye!");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let env = GenAiEnv::from_process_env();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        endpoint = %env.endpoint,
        "jvm-assist boot"
    );

    let client = GenAiClient::new(&env, GenerationParams::default())
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let store = ChromaStore::new(CHROMA_BASE_URL, CHROMA_COLLECTION);

    let assistant = Assistant::new(
        client.clone(),
        client,
        store,
        PromptTemplate::java_troubleshooting(),
        RetrievalOptions::default(),
        ChunkingOptions::default(),
    );

    if cli.create_vector_store {
        assistant
            .clear_vector_store()
            .await
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;

        let report = assistant
            .build_vector_store(Path::new(KNOWLEDGE_DOCS_DIR))
            .await
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;

        for file in &report.files {
            info!(
                path = %file.path.display(),
                checksum = %file.checksum,
                chunks = file.chunk_count,
                ingested_at = %file.ingested_at.to_rfc3339(),
                "ingested pdf"
            );
        }
        info!(
            folder = KNOWLEDGE_DOCS_DIR,
            chunk_count = report.chunks.len(),
            "vector store created"
        );
    }

    println!("Ask me a Java troubleshooting question! Type 'exit' to quit.");

    let stdin = io::stdin();
    run_loop(&assistant, stdin.lock().lines()).await
}

#[cfg(test)]
mod tests {
    use super::{classify_input, run_loop, LoopAction};
    use async_trait::async_trait;
    use jvm_assist_core::{
        Assistant, ChatBackend, ChatReply, ChunkingOptions, Embedder, InferenceError, Message,
        PromptTemplate, RetrievalOptions, ScoredChunk, StoreError, VectorStore,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CallCounter {
        embeds: Arc<AtomicUsize>,
        chats: Arc<AtomicUsize>,
        queries: Arc<AtomicUsize>,
    }

    struct CountingEmbedder(CallCounter);
    struct CountingChat(CallCounter);
    struct CountingStore(CallCounter);

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, InferenceError> {
            self.0.embeds.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.0; 4])
        }
    }

    #[async_trait]
    impl ChatBackend for CountingChat {
        async fn chat(&self, _messages: &[Message]) -> Result<ChatReply, InferenceError> {
            self.0.chats.fetch_add(1, Ordering::SeqCst);
            Ok(ChatReply {
                text: "use jcmd".to_string(),
                candidates: vec![Message::assistant("use jcmd")],
            })
        }
    }

    #[async_trait]
    impl VectorStore for CountingStore {
        async fn ensure_collection(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn remove_all(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn add_all(
            &self,
            _embeddings: &[Vec<f32>],
            _texts: &[String],
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn query(
            &self,
            _embedding: &[f32],
            _max_results: usize,
            _min_score: f64,
        ) -> Result<Vec<ScoredChunk>, StoreError> {
            self.0.queries.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn counting_assistant(
        counter: &CallCounter,
    ) -> Assistant<CountingEmbedder, CountingChat, CountingStore> {
        Assistant::new(
            CountingEmbedder(counter.clone()),
            CountingChat(counter.clone()),
            CountingStore(counter.clone()),
            PromptTemplate::new("C: {context} Q: {question}"),
            RetrievalOptions::default(),
            ChunkingOptions::default(),
        )
    }

    #[test]
    fn exit_is_case_insensitive() {
        assert_eq!(classify_input("exit"), LoopAction::Quit);
        assert_eq!(classify_input("EXIT"), LoopAction::Quit);
        assert_eq!(classify_input("  Exit "), LoopAction::Quit);
    }

    #[test]
    fn blank_lines_are_skipped_and_questions_trimmed() {
        assert_eq!(classify_input(""), LoopAction::Skip);
        assert_eq!(classify_input("   "), LoopAction::Skip);
        assert_eq!(
            classify_input("  why is gc slow?  "),
            LoopAction::Ask("why is gc slow?")
        );
    }

    #[tokio::test]
    async fn exit_terminates_without_inference_calls() {
        let counter = CallCounter::default();
        let assistant = counting_assistant(&counter);
        let lines: Vec<std::io::Result<String>> = vec![Ok("EXIT".to_string())];

        run_loop(&assistant, lines.into_iter()).await.unwrap();

        assert_eq!(counter.embeds.load(Ordering::SeqCst), 0);
        assert_eq!(counter.chats.load(Ordering::SeqCst), 0);
        assert_eq!(counter.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn questions_before_exit_are_answered_once() {
        let counter = CallCounter::default();
        let assistant = counting_assistant(&counter);
        let lines: Vec<std::io::Result<String>> = vec![
            Ok("what is a safepoint?".to_string()),
            Ok("exit".to_string()),
        ];

        run_loop(&assistant, lines.into_iter()).await.unwrap();

        assert_eq!(counter.embeds.load(Ordering::SeqCst), 1);
        assert_eq!(counter.chats.load(Ordering::SeqCst), 1);
        assert_eq!(counter.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn eof_terminates_without_inference_calls() {
        let counter = CallCounter::default();
        let assistant = counting_assistant(&counter);
        let lines: Vec<std::io::Result<String>> = Vec::new();

        run_loop(&assistant, lines.into_iter()).await.unwrap();

        assert_eq!(counter.embeds.load(Ordering::SeqCst), 0);
        assert_eq!(counter.chats.load(Ordering::SeqCst), 0);
    }
}
