//! Application configuration from YAML
//!
//! Every field has a default, so an empty document (or no file at all)
//! yields a working configuration. Secrets are never read from the file;
//! they come from `OPENAI_API_KEY` and `TAVILY_API_KEY`.

use crate::{
    model::{client::DEFAULT_ENDPOINT, openai::ImageSettings, ModelClientConfig},
    pipelines::PipelineSettings,
    search::tavily::DEFAULT_TAVILY_ENDPOINT,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelSection,
    pub pipelines: PipelineSettings,
    pub search: SearchSection,
    pub image: ImageSection,
    pub runner: RunnerSection,
    pub storage: StorageSection,
}

/// Model endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub endpoint: String,

    /// Timeout for a single model call (in seconds)
    pub timeout_secs: u64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_TAVILY_ENDPOINT.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSection {
    pub enabled: bool,
    pub model_id: String,
    pub size: String,
}

impl Default for ImageSection {
    fn default() -> Self {
        let defaults = ImageSettings::default();
        Self {
            enabled: true,
            model_id: defaults.model_id,
            size: defaults.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// Bound on a whole pipeline run (in seconds)
    pub timeout_secs: u64,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            timeout_secs: crate::execution::runner::DEFAULT_RUN_TIMEOUT_SECS,
        }
    }
}

/// Where reports and memory live; unset paths use the platform data dir
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub reports_dir: Option<PathBuf>,
    pub memory_db: Option<PathBuf>,
}

impl StorageSection {
    fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crew-pipeline")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("reports"))
    }

    pub fn memory_db(&self) -> PathBuf {
        self.memory_db
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("memory.db"))
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AppConfig = if yaml.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(yaml).context("Invalid configuration YAML")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.timeout_secs == 0 {
            anyhow::bail!("model.timeout_secs must be greater than zero");
        }
        if self.search.timeout_secs == 0 {
            anyhow::bail!("search.timeout_secs must be greater than zero");
        }
        if self.runner.timeout_secs == 0 {
            anyhow::bail!("runner.timeout_secs must be greater than zero");
        }
        if self.pipelines.model_id.trim().is_empty() {
            anyhow::bail!("pipelines.model_id must not be empty");
        }
        if self.pipelines.research.max_search_results == 0 {
            anyhow::bail!("pipelines.research.max_search_results must be greater than zero");
        }

        for (step, tuning) in self.pipelines.tunings() {
            if tuning.max_output_tokens == 0 {
                anyhow::bail!("Step '{}' has max_output_tokens = 0", step);
            }
            if !(0.0..=2.0).contains(&tuning.temperature) {
                anyhow::bail!(
                    "Step '{}' has temperature {} outside 0.0..=2.0",
                    step,
                    tuning.temperature
                );
            }
        }

        Ok(())
    }

    /// Model client settings, with the API key taken from the environment
    pub fn model_client_config(&self) -> ModelClientConfig {
        ModelClientConfig::from_env()
            .with_endpoint(&self.model.endpoint)
            .with_timeout(self.model.timeout_secs)
    }

    pub fn image_settings(&self) -> ImageSettings {
        ImageSettings {
            model_id: self.image.model_id.clone(),
            size: self.image.size.clone(),
        }
    }
}
