//! crew-pipeline - research and marketing pipelines chained over an LLM API

pub mod cli;
pub mod config;
pub mod core;
pub mod execution;
pub mod model;
pub mod persistence;
pub mod pipelines;
pub mod search;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use core::{
    ExecutionContext, PipelineError, PipelineInput, PipelineSpec, PipelineStepSpec, PromptTemplate,
    RunState, StepError, StepResult,
};
pub use execution::{CancellationFlag, PipelineRun, PipelineRunner, RunEvent, StepExecutor};
pub use model::{LanguageModelClient, ModelError, ModelInvoker, OpenAiClient};
pub use pipelines::{MarketingContent, MarketingPipeline, ResearchPipeline};
