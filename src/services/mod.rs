//! Caller-side services around the pipelines

pub mod naming;
pub mod research;

pub use naming::{report_file_name, sanitize_filename};
pub use research::{summarize_report, ResearchOutcome, ResearchService};
