mod gemini;

pub use gemini::GeminiGenerator;

use async_trait::async_trait;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Generation API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Generation API returned no text")]
    EmptyResponse,
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Anything that can turn a prompt into a single block of text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
