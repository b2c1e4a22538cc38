//! Core domain models for pipelines
//!
//! This module defines the fundamental data structures that represent
//! pipelines, steps, templates and their per-run context.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod step;
pub mod template;

pub use context::*;
pub use error::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
pub use template::*;
