//! Run state machine

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// State of a pipeline run
///
/// `Pending -> Running(i) -> Completed | Failed(i) | Cancelled(i)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Run has not started
    Pending,
    /// Step at this index is executing
    Running(usize),
    /// Every step succeeded
    Completed,
    /// Step at this index failed; later steps never ran
    Failed(usize),
    /// Cancellation was observed before the step at this index started
    Cancelled(usize),
}

impl RunState {
    /// Check if the run reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed(_) | RunState::Cancelled(_)
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunState::Completed)
    }
}

/// Identity and timing of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    /// Unique run ID
    pub run_id: Uuid,

    /// Name of the pipeline
    pub pipeline_name: String,

    /// When execution started
    pub started_at: DateTime<Utc>,

    /// When execution reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunInfo {
    pub fn start(pipeline_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline_name: pipeline_name.into(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Elapsed wall time, if finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}
