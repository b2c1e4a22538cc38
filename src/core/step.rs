//! Step definitions

use crate::core::template::PromptTemplate;
use serde::{Deserialize, Serialize};

/// Model parameters for a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl ModelParams {
    pub fn new(model_id: impl Into<String>, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            model_id: model_id.into(),
            temperature,
            max_output_tokens,
        }
    }
}

/// The shape of output a step is asked to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedOutput {
    /// Free text described in prose
    FreeText(String),
    /// Markdown with the given level-2 headings, in order
    Sections {
        description: String,
        headings: Vec<String>,
    },
}

impl ExpectedOutput {
    /// Instruction appended to the rendered prompt
    pub fn instruction(&self) -> String {
        match self {
            ExpectedOutput::FreeText(description) => {
                format!("\n\n--- RESULTADO ESPERADO: {}\n", description)
            }
            ExpectedOutput::Sections {
                description,
                headings,
            } => {
                let mut text = format!("\n\n--- RESULTADO ESPERADO: {}\n", description);
                text.push_str("Secciones obligatorias:\n");
                for heading in headings {
                    text.push_str(&format!("## {}\n", heading));
                }
                text
            }
        }
    }

    /// Headings required but absent from the output
    pub fn missing_sections(&self, output: &str) -> Vec<String> {
        match self {
            ExpectedOutput::FreeText(_) => Vec::new(),
            ExpectedOutput::Sections { headings, .. } => headings
                .iter()
                .filter(|h| !output.contains(&format!("## {}", h)))
                .cloned()
                .collect(),
        }
    }
}

/// Post-processing applied to a step's raw output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFilter {
    #[default]
    None,
    /// Remove one pair of wrapping quote characters
    StripQuotes,
}

impl OutputFilter {
    pub fn apply(self, output: String) -> String {
        match self {
            OutputFilter::None => output,
            OutputFilter::StripQuotes => strip_wrapping_quotes(&output).to_string(),
        }
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    const QUOTES: [char; 4] = ['"', '\'', '“', '”'];
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if QUOTES.contains(&first) && QUOTES.contains(&last) => {
            trimmed[first.len_utf8()..trimmed.len() - last.len_utf8()].trim()
        }
        _ => trimmed,
    }
}

/// What the step calls once its prompt is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Invocation {
    /// Text completion through the language model
    #[default]
    Completion,
    /// Image generation; the rendered prompt is the image description
    Image,
}

/// A statically defined pipeline step
#[derive(Debug, Clone)]
pub struct PipelineStepSpec {
    /// Unique step name
    pub name: String,

    /// System instruction describing the step's role
    pub role_instruction: String,

    /// User prompt template
    pub template: PromptTemplate,

    /// Earlier steps whose output this step reads
    pub depends_on: Vec<String>,

    pub model_params: ModelParams,

    pub expected_output: ExpectedOutput,

    pub output_filter: OutputFilter,

    pub invocation: Invocation,
}

impl PipelineStepSpec {
    pub fn new(
        name: impl Into<String>,
        role_instruction: impl Into<String>,
        template: impl Into<PromptTemplate>,
        model_params: ModelParams,
    ) -> Self {
        Self {
            name: name.into(),
            role_instruction: role_instruction.into(),
            template: template.into(),
            depends_on: Vec::new(),
            model_params,
            expected_output: ExpectedOutput::FreeText(String::new()),
            output_filter: OutputFilter::None,
            invocation: Invocation::Completion,
        }
    }

    pub fn depends_on<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn expecting(mut self, expected: ExpectedOutput) -> Self {
        self.expected_output = expected;
        self
    }

    pub fn with_filter(mut self, filter: OutputFilter) -> Self {
        self.output_filter = filter;
        self
    }

    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.invocation = invocation;
        self
    }

    /// Build the prompt sent to the model: rendered template plus the
    /// expected-output instruction
    pub fn build_effective_prompt(&self, rendered: &str) -> String {
        match &self.expected_output {
            ExpectedOutput::FreeText(description) if description.is_empty() => rendered.to_string(),
            expected => format!("{}{}", rendered, expected.instruction()),
        }
    }
}
