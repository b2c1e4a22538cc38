//! Pipeline runner - drives a spec through its steps in order

use crate::{
    core::{
        ExecutionContext, PipelineError, PipelineInput, PipelineSpec, RunInfo, RunState,
        StepError, StepResult,
    },
    execution::StepExecutor,
    model::ModelError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{timeout, Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Default bound on a whole run, in seconds
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Events that occur during a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    PipelineStarted {
        run_id: Uuid,
        pipeline_name: String,
        total_steps: usize,
    },
    StepStarted {
        index: usize,
        step_name: String,
    },
    StepCompleted {
        index: usize,
        step_name: String,
        output_len: usize,
    },
    StepFailed {
        index: usize,
        step_name: String,
        error: String,
    },
    PipelineFinished {
        run_id: Uuid,
        state: RunState,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// Cooperative cancellation signal, checked between steps
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a run: terminal state plus every recorded step result
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub info: RunInfo,
    pub state: RunState,
    pub context: ExecutionContext,
    error: Option<PipelineError>,
    final_step: String,
}

impl PipelineRun {
    /// The pipeline result, when every step succeeded
    pub fn output(&self) -> Option<&str> {
        if self.state.is_completed() {
            self.context.output_of(&self.final_step)
        } else {
            None
        }
    }

    /// Output of an individual step that succeeded
    pub fn step_output(&self, step_name: &str) -> Option<&str> {
        self.context.output_of(step_name)
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    pub fn into_result(self) -> Result<String, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.context
            .output_of(&self.final_step)
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::new(
                    &self.final_step,
                    StepError::Model(ModelError::EmptyResponse),
                )
            })
    }
}

/// Runs pipeline specs sequentially with fail-fast semantics
///
/// A runner holds no per-run state, so one instance can serve concurrent
/// runs; each run owns its own `ExecutionContext` and cancellation flag.
pub struct PipelineRunner {
    executor: StepExecutor,
    event_handlers: Vec<EventHandler>,
    shutdown: CancellationFlag,
    run_timeout: Duration,
}

impl PipelineRunner {
    pub fn new(executor: StepExecutor) -> Self {
        Self {
            executor,
            event_handlers: Vec::new(),
            shutdown: CancellationFlag::new(),
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
        }
    }

    /// Add an event handler
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
        self
    }

    /// Process-wide stop signal (Ctrl-C)
    ///
    /// Once set, every run on this runner stops before its next step and
    /// later runs end at `Cancelled(0)`. Use `execute_with` to cancel a
    /// single run.
    pub fn with_shutdown(mut self, shutdown: CancellationFlag) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_run_timeout(mut self, secs: u64) -> Self {
        self.run_timeout = Duration::from_secs(secs);
        self
    }

    pub fn executor(&self) -> &StepExecutor {
        &self.executor
    }

    pub fn shutdown(&self) -> &CancellationFlag {
        &self.shutdown
    }

    fn emit_event(&self, event: RunEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Run the pipeline and return the final step's output
    pub async fn run(
        &self,
        spec: &PipelineSpec,
        inputs: &PipelineInput,
    ) -> Result<String, PipelineError> {
        self.execute(spec, inputs).await.into_result()
    }

    /// Run the pipeline and return the full outcome
    pub async fn execute(&self, spec: &PipelineSpec, inputs: &PipelineInput) -> PipelineRun {
        self.execute_with(spec, inputs, &CancellationFlag::new()).await
    }

    /// Run the pipeline under a caller-owned cancellation flag
    ///
    /// The flag is checked before each step; a step already in flight
    /// finishes first.
    pub async fn execute_with(
        &self,
        spec: &PipelineSpec,
        inputs: &PipelineInput,
        cancellation: &CancellationFlag,
    ) -> PipelineRun {
        let mut info = RunInfo::start(spec.name());
        let mut context = ExecutionContext::new();
        let mut error = None;
        let mut state = RunState::Pending;
        let started = Instant::now();

        info!("Starting pipeline run: {} ({})", spec.name(), info.run_id);
        self.emit_event(RunEvent::PipelineStarted {
            run_id: info.run_id,
            pipeline_name: spec.name().to_string(),
            total_steps: spec.len(),
        });

        for (index, step) in spec.steps().iter().enumerate() {
            if cancellation.is_cancelled() || self.shutdown.is_cancelled() {
                warn!("Run {} cancelled before step {}", info.run_id, step.name);
                state = RunState::Cancelled(index);
                error = Some(PipelineError::new(&step.name, StepError::Cancelled));
                break;
            }

            state = RunState::Running(index);
            self.emit_event(RunEvent::StepStarted {
                index,
                step_name: step.name.clone(),
            });

            let remaining = self.run_timeout.saturating_sub(started.elapsed());
            let result = if remaining.is_zero() {
                self.deadline_failure(&step.name)
            } else {
                match timeout(remaining, self.executor.execute(step, inputs, &context)).await {
                    Ok(result) => result,
                    Err(_) => self.deadline_failure(&step.name),
                }
            };

            if result.succeeded {
                self.emit_event(RunEvent::StepCompleted {
                    index,
                    step_name: step.name.clone(),
                    output_len: result.output_text.len(),
                });
                context.record(result);
                continue;
            }

            let cause = result
                .error
                .clone()
                .unwrap_or(StepError::Model(ModelError::EmptyResponse));
            error!("Step {} failed: {}", step.name, cause);
            self.emit_event(RunEvent::StepFailed {
                index,
                step_name: step.name.clone(),
                error: cause.to_string(),
            });
            context.record(result);
            state = RunState::Failed(index);
            error = Some(PipelineError::new(&step.name, cause));
            break;
        }

        if let RunState::Running(_) = state {
            state = RunState::Completed;
        }
        info.finish();

        info!("Pipeline run finished: {} - {:?}", spec.name(), state);
        self.emit_event(RunEvent::PipelineFinished {
            run_id: info.run_id,
            state,
        });

        PipelineRun {
            info,
            state,
            context,
            error,
            final_step: spec.final_step().name.clone(),
        }
    }

    fn deadline_failure(&self, step_name: &str) -> StepResult {
        warn!("Run deadline reached during step {}", step_name);
        StepResult::failure(
            step_name,
            StepError::Model(ModelError::timeout(self.run_timeout.as_secs())),
        )
    }
}
