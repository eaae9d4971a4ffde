use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("no pdf files found in {0}")]
    NoDocuments(String),
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("credential error: {0}")]
    Credentials(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("inference endpoint returned {status}: {details}")]
    BackendStatus { status: String, details: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store request failed: {0}")]
    Request(String),
}

/// Umbrella error for assistant operations, which cross ingestion,
/// inference, and the vector store in one flow.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = AssistError> = std::result::Result<T, E>;
