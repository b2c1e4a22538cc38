//! OpenAI-compatible HTTP client for chat completions and image generation
//!
//! The API key is only ever sent to the configured endpoint.

use crate::model::{
    CompletionRequest, ImageGenerator, LanguageModelClient, ModelClientConfig, ModelError,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Image generation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSettings {
    pub model_id: String,
    pub size: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            model_id: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
        }
    }
}

/// Client for OpenAI-compatible APIs
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: ModelClientConfig,
    image: ImageSettings,
}

impl OpenAiClient {
    pub fn new(config: ModelClientConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::unknown(&e))?;

        Ok(Self {
            http,
            config,
            image: ImageSettings::default(),
        })
    }

    pub fn with_image_settings(mut self, image: ImageSettings) -> Self {
        self.image = image;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn api_key(&self) -> Result<&str, ModelError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ModelError::AuthenticationFailure("OPENAI_API_KEY is not set".to_string()))
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ModelError> {
        let url = format!("{}/{}", self.config.endpoint, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(body)
            .send()
            .await
            .map_err(ModelError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, path, "OpenAI request failed");
            return Err(ModelError::from_http_status(status, body));
        }

        response.json::<R>().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::from_reqwest(e)
            } else {
                ModelError::unknown(&e)
            }
        })
    }
}

#[async_trait]
impl LanguageModelClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let body = ChatRequest {
            model: &request.model_id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response: ChatResponse = self.post_json("chat/completions", &body).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ModelError::EmptyResponse)?;

        debug!(model = %request.model_id, "Chat completion returned {} bytes", content.len());
        Ok(content)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate_image(&self, prompt: &str) -> Result<String, ModelError> {
        let body = ImageRequest {
            model: &self.image.model_id,
            prompt,
            n: 1,
            size: &self.image.size,
        };

        let response: ImageResponse = self.post_json("images/generations", &body).await?;
        let url = response
            .data
            .into_iter()
            .find_map(|d| d.url)
            .filter(|u| !u.is_empty())
            .ok_or(ModelError::EmptyResponse)?;

        debug!(model = %self.image.model_id, "Image generated");
        Ok(url)
    }
}
