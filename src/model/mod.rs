//! Language-model boundary: client traits, the invoker and the OpenAI client

pub mod client;
pub mod error;
pub mod invoker;
pub mod openai;

use async_trait::async_trait;
pub use client::ModelClientConfig;
pub use error::ModelError;
pub use invoker::ModelInvoker;
pub use openai::OpenAiClient;

/// A single chat-completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for text generation - allows for different implementations
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    /// Complete a prompt and return the raw generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}

/// Trait for image generation
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return its URL
    async fn generate_image(&self, prompt: &str) -> Result<String, ModelError>;
}
