//! Prompt templates with `{{ placeholder }}` substitution

use crate::core::context::{ExecutionContext, PipelineInput};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while rendering a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("missing required input '{0}'")]
    MissingInput(String),

    #[error("missing output of dependency step '{0}'")]
    MissingDependency(String),
}

/// A single placeholder found in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// `{{ name }}` - required pipeline input
    Input(String),
    /// `{{ name | fallback }}` - optional pipeline input
    OptionalInput { name: String, fallback: String },
    /// `{{ steps.<name>.output }}` - output of a completed step
    StepOutput(String),
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\{\{\s*([A-Za-z_][\w.]*)\s*(?:\|\s*(.*?)\s*)?\}\}")
            .expect("placeholder regex is valid")
    })
}

/// A prompt template
///
/// Rendering is a pure function of the pipeline inputs and the execution
/// context: the same inputs always produce byte-identical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The raw template text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All placeholders in order of appearance
    pub fn placeholders(&self) -> Vec<Placeholder> {
        placeholder_regex()
            .captures_iter(&self.text)
            .map(|caps| Self::classify(&caps[1], caps.get(2).map(|m| m.as_str())))
            .collect()
    }

    /// Names of the steps whose output this template reads
    pub fn step_references(&self) -> Vec<String> {
        self.placeholders()
            .into_iter()
            .filter_map(|p| match p {
                Placeholder::StepOutput(step) => Some(step),
                _ => None,
            })
            .collect()
    }

    /// Render the template against the inputs and completed step outputs
    pub fn render(
        &self,
        inputs: &PipelineInput,
        context: &ExecutionContext,
    ) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(self.text.len());
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(&self.text) {
            let whole = caps.get(0).expect("capture group 0 always exists");
            rendered.push_str(&self.text[last..whole.start()]);

            let value = match Self::classify(&caps[1], caps.get(2).map(|m| m.as_str())) {
                Placeholder::Input(name) => inputs
                    .get(&name)
                    .ok_or(TemplateError::MissingInput(name))?,
                Placeholder::OptionalInput { name, fallback } => {
                    match inputs.get(&name).filter(|v| !v.trim().is_empty()) {
                        Some(value) => value,
                        None => {
                            rendered.push_str(&fallback);
                            last = whole.end();
                            continue;
                        }
                    }
                }
                Placeholder::StepOutput(step) => context
                    .output_of(&step)
                    .ok_or(TemplateError::MissingDependency(step))?,
            };

            rendered.push_str(value);
            last = whole.end();
        }

        rendered.push_str(&self.text[last..]);
        Ok(rendered)
    }

    fn classify(name: &str, fallback: Option<&str>) -> Placeholder {
        if let Some(step) = name
            .strip_prefix("steps.")
            .and_then(|rest| rest.strip_suffix(".output"))
        {
            return Placeholder::StepOutput(step.to_string());
        }

        match fallback {
            Some(fallback) => Placeholder::OptionalInput {
                name: name.to_string(),
                fallback: fallback.to_string(),
            },
            None => Placeholder::Input(name.to_string()),
        }
    }
}

impl From<&str> for PromptTemplate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
