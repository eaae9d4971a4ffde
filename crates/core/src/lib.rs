pub mod assistant;
pub mod chat;
pub mod chunking;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod inference;
pub mod ingest;
pub mod stores;
pub mod traits;

pub use assistant::{Answer, Assistant, ComposedPrompt};
pub use chat::{ChatReply, Conversation, Message, Role};
pub use chunking::{normalize_whitespace, split_into_chunks};
pub use config::{
    ChunkingOptions, GenAiEnv, GenerationParams, PromptTemplate, RetrievalOptions,
};
pub use error::{AssistError, IngestError, InferenceError, StoreError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use inference::GenAiClient;
pub use ingest::{chunk_pdf_folder, discover_pdf_files, IngestedFile, IngestionReport};
pub use stores::ChromaStore;
pub use traits::{ChatBackend, Embedder, ScoredChunk, VectorStore};
