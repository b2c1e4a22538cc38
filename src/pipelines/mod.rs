//! The two fixed pipeline configurations

pub mod marketing;
pub mod research;

use crate::core::ModelParams;
use serde::{Deserialize, Serialize};

pub use marketing::{MarketingContent, MarketingPipeline, MarketingRequest, Platform};
pub use research::{ResearchPipeline, ResearchRequest};

/// Model used by every step unless overridden
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-0125";

/// Sampling settings for one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepTuning {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl StepTuning {
    pub const fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }

    pub fn params(&self, model_id: &str) -> ModelParams {
        ModelParams::new(model_id, self.temperature, self.max_output_tokens)
    }
}

/// Step settings for the research pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    pub researcher: StepTuning,
    pub editor: StepTuning,
    /// Search hits spliced into the researcher prompt
    pub max_search_results: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            researcher: StepTuning::new(0.6, 2500),
            editor: StepTuning::new(0.3, 2500),
            max_search_results: crate::search::DEFAULT_MAX_RESULTS,
        }
    }
}

/// Step settings for the marketing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketingSettings {
    pub ideas: StepTuning,
    pub post: StepTuning,
    pub image_prompt: StepTuning,
}

impl Default for MarketingSettings {
    fn default() -> Self {
        Self {
            ideas: StepTuning::new(0.8, 1000),
            post: StepTuning::new(0.7, 600),
            image_prompt: StepTuning::new(0.7, 350),
        }
    }
}

/// Per-pipeline settings sharing one model id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub model_id: String,
    pub research: ResearchSettings,
    pub marketing: MarketingSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL.to_string(),
            research: ResearchSettings::default(),
            marketing: MarketingSettings::default(),
        }
    }
}

impl PipelineSettings {
    /// Every step's tuning, labelled by step name
    pub fn tunings(&self) -> Vec<(&'static str, StepTuning)> {
        vec![
            (research::RESEARCHER, self.research.researcher),
            (research::EDITOR, self.research.editor),
            (marketing::IDEAS, self.marketing.ideas),
            (marketing::POST, self.marketing.post),
            (marketing::IMAGE_PROMPT, self.marketing.image_prompt),
        ]
    }
}
