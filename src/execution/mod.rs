//! Pipeline execution: single steps and whole runs

pub mod executor;
pub mod runner;

pub use executor::StepExecutor;
pub use runner::{CancellationFlag, EventHandler, PipelineRun, PipelineRunner, RunEvent};
