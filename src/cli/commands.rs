//! CLI command definitions

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Research a topic and produce an edited report
#[derive(Debug, Args, Clone)]
pub struct ResearchCommand {
    /// Topic to research
    #[arg(short, long)]
    pub topic: String,

    /// Additional content to analyze
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the content to analyze from a file
    #[arg(long)]
    pub content_file: Option<PathBuf>,

    /// Skip web search even when it is configured
    #[arg(long)]
    pub no_search: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl ResearchCommand {
    /// The content to analyze, read from disk when given as a file
    pub fn content(&self) -> Result<Option<String>> {
        match (&self.content, &self.content_file) {
            (Some(content), _) => Ok(Some(content.clone())),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("Failed to read content file {}", path.display())),
            (None, None) => Ok(None),
        }
    }
}

/// Generate social media content
#[derive(Debug, Args, Clone)]
pub struct MarketingCommand {
    /// Topic or product to promote
    #[arg(short, long)]
    pub topic: String,

    /// Target platform (Instagram, LinkedIn, Twitter/X, Facebook, General)
    #[arg(short, long)]
    pub platform: String,

    /// Additional context for the ideas and the post
    #[arg(long)]
    pub context: Option<String>,

    /// Also generate an image
    #[arg(long)]
    pub image: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Query past research
#[derive(Debug, Args, Clone)]
pub struct MemoryCommand {
    /// Free-text query
    #[arg(short, long)]
    pub query: String,

    /// Number of results to return
    #[arg(short = 'k', long, default_value_t = 5)]
    pub top_k: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate the configuration and show both pipelines
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
