mod ollama;

pub use ollama::OllamaGenerator;

use anyhow::Result;
use async_trait::async_trait;

/// Output of one generation call, counters included so the caller can put
/// them into turn metadata. The duration fields are nanoseconds, passed
/// through from the backend unconverted.
#[derive(Debug, Clone)]
pub struct Generation {
    pub content: String,
    pub model: String,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub time_to_read: Option<u64>,
    pub time_to_generate: Option<u64>,
}

/// The text-generation collaborator. One call per prompt; the core never
/// retries, so implementations should not either.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation>;
}
