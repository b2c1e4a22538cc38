//! Step executor - runs an individual step against the model

use crate::{
    core::{ExecutionContext, Invocation, PipelineInput, PipelineStepSpec, StepError, StepResult},
    model::{ImageGenerator, ModelError, ModelInvoker},
};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

/// Executes a single step
///
/// Every failure is captured in the returned `StepResult`; nothing
/// escapes as an error.
#[derive(Clone)]
pub struct StepExecutor {
    invoker: ModelInvoker,
    images: Option<Arc<dyn ImageGenerator>>,
}

impl StepExecutor {
    pub fn new(invoker: ModelInvoker) -> Self {
        Self {
            invoker,
            images: None,
        }
    }

    pub fn with_image_generator(mut self, images: Arc<dyn ImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn has_image_generator(&self) -> bool {
        self.images.is_some()
    }

    /// Execute a step and return its result
    pub async fn execute(
        &self,
        step: &PipelineStepSpec,
        inputs: &PipelineInput,
        context: &ExecutionContext,
    ) -> StepResult {
        info!("Executing step: {}", step.name);

        let scoped = context.scoped(&step.depends_on);
        let rendered = match step.template.render(inputs, &scoped) {
            Ok(rendered) => rendered,
            Err(e) => {
                error!("Template error for step {}: {}", step.name, e);
                return StepResult::failure(&step.name, e.into());
            }
        };

        let effective_prompt = step.build_effective_prompt(&rendered);
        debug!(
            "Effective prompt for step {} is {} bytes",
            step.name,
            effective_prompt.len()
        );

        let output = match step.invocation {
            Invocation::Completion => {
                self.invoker
                    .generate(&step.role_instruction, &effective_prompt, &step.model_params)
                    .await
            }
            Invocation::Image => self.generate_image(&rendered).await,
        };

        match output {
            Ok(output) => {
                let output = step.output_filter.apply(output);
                if output.trim().is_empty() {
                    warn!("Step {} output is empty after filtering", step.name);
                    return StepResult::failure(&step.name, StepError::Model(ModelError::EmptyResponse));
                }
                let missing = step.expected_output.missing_sections(&output);
                if !missing.is_empty() {
                    warn!(
                        "Step {} output is missing sections: {}",
                        step.name,
                        missing.join(", ")
                    );
                }
                info!("Step {} completed successfully", step.name);
                StepResult::success(&step.name, output)
            }
            Err(e) => {
                error!("Model error for step {}: {}", step.name, e);
                StepResult::failure(&step.name, StepError::Model(e))
            }
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ModelError> {
        let images = self.images.as_ref().ok_or_else(|| {
            ModelError::InvalidRequest("no image generator is configured".to_string())
        })?;

        if prompt.trim().is_empty() {
            return Err(ModelError::InvalidRequest("image prompt is empty".to_string()));
        }

        let secs = self.invoker.timeout_secs();
        timeout(Duration::from_secs(secs), images.generate_image(prompt.trim()))
            .await
            .map_err(|_| ModelError::timeout(secs))?
    }
}
