//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{MarketingCommand, MemoryCommand, ResearchCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Research and marketing pipelines over an LLM API
#[derive(Debug, Parser, Clone)]
#[command(name = "crew")]
#[command(version = "0.1.0")]
#[command(about = "Research reports and social media content from chained LLM calls", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Research a topic
    Research(ResearchCommand),

    /// Generate marketing content
    Marketing(MarketingCommand),

    /// Query past research
    Memory(MemoryCommand),

    /// Validate the configuration
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
