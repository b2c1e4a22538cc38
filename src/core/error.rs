//! Error taxonomy shared by steps, specs and runs

use crate::core::template::TemplateError;
use crate::model::ModelError;
use crate::search::SearchError;
use thiserror::Error;

/// Classified cause of a failed step
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("run cancelled")]
    Cancelled,
}

impl StepError {
    /// Whether a caller may retry after backing off
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StepError::Model(ModelError::RateLimited(_)))
    }
}

/// Failure of a whole pipeline run: the first failing step and its cause
#[derive(Debug, Clone, PartialEq, Error)]
#[error("step '{step}' failed: {cause}")]
pub struct PipelineError {
    pub step: String,
    pub cause: StepError,
}

impl PipelineError {
    pub fn new(step: impl Into<String>, cause: StepError) -> Self {
        Self {
            step: step.into(),
            cause,
        }
    }

    pub fn message(&self) -> String {
        self.cause.to_string()
    }
}

/// Invalid pipeline definition, detected when the spec is built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("pipeline '{0}' has no steps")]
    Empty(String),

    #[error("duplicate step name '{0}'")]
    DuplicateStep(String),

    #[error("step '{step}' depends on '{dependency}', which is not an earlier step")]
    ForwardReference { step: String, dependency: String },

    #[error("step '{step}' reads the output of '{dependency}' without declaring it in depends_on")]
    UndeclaredDependency { step: String, dependency: String },

    #[error("step '{step}' has max_output_tokens = 0")]
    ZeroMaxTokens { step: String },
}
