use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The OCI Generative AI inference endpoint. The service is regional; this
/// is the Chicago region endpoint.
pub const GENAI_ENDPOINT: &str =
    "https://inference.generativeai.us-chicago-1.oci.oraclecloud.com";

/// Location of the OCI credential file and the profile within it.
pub const CONFIG_LOCATION: &str = "~/.oci/config";
pub const CONFIG_PROFILE: &str = "DEFAULT";

/// Environment variable holding the compartment OCID with the Generative AI
/// policies attached.
pub const COMPARTMENT_ID_VAR: &str = "COMPARTMENT_ID";

pub const EMBEDDING_MODEL_ID: &str = "cohere.embed-english-v3.0";
pub const CHAT_MODEL_ID: &str = "meta.llama-3.1-405b-instruct";

pub const CHROMA_BASE_URL: &str = "http://localhost:8000";
pub const CHROMA_COLLECTION: &str = "java-collection";

/// Folder holding the PDF knowledge base, ingested on `--createVectorStore`.
pub const KNOWLEDGE_DOCS_DIR: &str = "./knowledge-docs/";

const READ_TIMEOUT_SECS: u64 = 240;

/// Process-wide environment for the inference clients, read once at startup.
#[derive(Debug, Clone)]
pub struct GenAiEnv {
    pub endpoint: String,
    pub config_location: PathBuf,
    pub config_profile: String,
    /// Passed through to the service uninspected; an absent or empty value
    /// surfaces as a remote authorization failure.
    pub compartment_id: String,
    pub read_timeout: Duration,
}

impl GenAiEnv {
    pub fn from_process_env() -> Self {
        Self {
            endpoint: GENAI_ENDPOINT.to_string(),
            config_location: expand_home(CONFIG_LOCATION),
            config_profile: CONFIG_PROFILE.to_string(),
            compartment_id: std::env::var(COMPARTMENT_ID_VAR).unwrap_or_default(),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

/// Generation parameters sent with every chat request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub num_generations: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: i32,
    pub frequency_penalty: f64,
    pub is_stream: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            num_generations: 1,
            temperature: 0.75,
            top_p: 1.0,
            top_k: 1,
            frequency_penalty: 0.0,
            is_stream: false,
        }
    }
}

/// Retrieval settings for the question-answer loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalOptions {
    pub max_results: usize,
    pub min_score: f64,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            min_score: 0.7,
        }
    }
}

/// Splitter settings. Tokens are whitespace-delimited words.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingOptions {
    pub max_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_tokens: 800,
            overlap_tokens: 40,
        }
    }
}

/// A prompt template with `{context}` and `{question}` slots, kept as data
/// so it can be tested and swapped independently of the pipeline.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn java_troubleshooting() -> Self {
        Self::new(
            "You are a Java Troubleshooting Assistant. Answer the question in the context of Java or HotSpot JVM.\n\
             Always ask if the user would like to know more about the topic. Do not add signature at the end of the answer.\n\
             Use only the following pieces of context to answer the question at the end.\n\
             \n\
             Context: {context}\n\
             \n\
             Question: {question}\n\
             \n\
             Helpful Answer:\n",
        )
    }

    pub fn render(&self, question: &str, context: &str) -> String {
        self.template
            .replace("{context}", context)
            .replace("{question}", question)
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
