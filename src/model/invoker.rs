//! Single guarded model call

use crate::core::ModelParams;
use crate::model::{CompletionRequest, LanguageModelClient, ModelError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Wraps one call to a text-generation model
///
/// Validates the request, enforces the per-call timeout and trims the
/// result. Never retries; a `RateLimited` error is handed back to the caller.
#[derive(Clone)]
pub struct ModelInvoker {
    client: Arc<dyn LanguageModelClient>,
    timeout_secs: u64,
}

impl ModelInvoker {
    pub fn new(client: Arc<dyn LanguageModelClient>, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Generate text for a system instruction and user prompt
    pub async fn generate(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        params: &ModelParams,
    ) -> Result<String, ModelError> {
        if user_prompt.trim().is_empty() {
            return Err(ModelError::InvalidRequest("user prompt is empty".to_string()));
        }
        if params.max_output_tokens == 0 {
            return Err(ModelError::InvalidRequest(
                "max_output_tokens must be greater than zero".to_string(),
            ));
        }

        let request = CompletionRequest {
            system: system_instruction.to_string(),
            user: user_prompt.to_string(),
            model_id: params.model_id.clone(),
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };

        debug!(
            model = %params.model_id,
            system_len = system_instruction.len(),
            prompt_len = user_prompt.len(),
            "Invoking model"
        );

        let raw = timeout(
            Duration::from_secs(self.timeout_secs),
            self.client.complete(&request),
        )
        .await
        .map_err(|_| {
            warn!(model = %params.model_id, "Model call timed out after {}s", self.timeout_secs);
            ModelError::timeout(self.timeout_secs)
        })??;

        let text = raw.trim();
        if text.is_empty() {
            warn!(model = %params.model_id, "Model returned an empty response");
            return Err(ModelError::EmptyResponse);
        }

        debug!(model = %params.model_id, output_len = text.len(), "Model call succeeded");
        Ok(text.to_string())
    }
}
