//! Pipeline inputs, step results and the per-run execution context

use crate::core::error::StepError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Initial inputs of a pipeline run
///
/// Supplied once when the run starts and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInput {
    values: BTreeMap<String, String>,
}

impl PipelineInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Insert only when a value is present
    pub fn with_optional(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Get a value that is present and not blank
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PipelineInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Name of the step that produced this result
    pub step_name: String,

    /// Generated text (empty on failure)
    pub output_text: String,

    /// Whether the step succeeded
    pub succeeded: bool,

    /// Classified cause when the step failed
    pub error: Option<StepError>,
}

impl StepResult {
    pub fn success(step_name: impl Into<String>, output_text: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            output_text: output_text.into(),
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(step_name: impl Into<String>, error: StepError) -> Self {
        Self {
            step_name: step_name.into(),
            output_text: String::new(),
            succeeded: false,
            error: Some(error),
        }
    }

    /// Human-readable error message, if the step failed
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

/// Step results accumulated during one pipeline run, in completion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    results: Vec<StepResult>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the result of a finished step
    ///
    /// A step name is recorded at most once; a second result for the same
    /// step replaces the first in place.
    pub fn record(&mut self, result: StepResult) {
        match self.results.iter_mut().find(|r| r.step_name == result.step_name) {
            Some(existing) => *existing = result,
            None => self.results.push(result),
        }
    }

    pub fn get(&self, step_name: &str) -> Option<&StepResult> {
        self.results.iter().find(|r| r.step_name == step_name)
    }

    /// Output of a step that completed successfully
    pub fn output_of(&self, step_name: &str) -> Option<&str> {
        self.get(step_name)
            .filter(|r| r.succeeded)
            .map(|r| r.output_text.as_str())
    }

    /// A copy restricted to the named steps, preserving insertion order
    pub fn scoped(&self, step_names: &[String]) -> ExecutionContext {
        ExecutionContext {
            results: self
                .results
                .iter()
                .filter(|r| step_names.contains(&r.step_name))
                .cloned()
                .collect(),
        }
    }

    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn last(&self) -> Option<&StepResult> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
