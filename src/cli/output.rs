//! CLI output formatting

use crate::{
    core::RunState,
    execution::RunEvent,
    persistence::MemoryMatch,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner for a running step
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a run state for display
pub fn format_run_state(state: RunState) -> String {
    match state {
        RunState::Pending => style("PENDING").dim().to_string(),
        RunState::Running(i) => style(format!("RUNNING (step {})", i + 1)).yellow().to_string(),
        RunState::Completed => style("COMPLETED").green().to_string(),
        RunState::Failed(i) => style(format!("FAILED (step {})", i + 1)).red().to_string(),
        RunState::Cancelled(i) => style(format!("CANCELLED (before step {})", i + 1))
            .yellow()
            .to_string(),
    }
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::PipelineStarted {
            run_id,
            pipeline_name,
            total_steps,
        } => format!(
            "{} Starting pipeline {} with {} steps ({})",
            ROCKET,
            style(pipeline_name).bold(),
            total_steps,
            style(&run_id.to_string()[..8]).dim()
        ),
        RunEvent::StepStarted { step_name, .. } => format!("{} {}", SPINNER, style(step_name).cyan()),
        RunEvent::StepCompleted {
            step_name,
            output_len,
            ..
        } => format!(
            "{} {} {}",
            CHECK,
            style(step_name).green(),
            style(format!("({} bytes)", output_len)).dim()
        ),
        RunEvent::StepFailed {
            step_name, error, ..
        } => format!("{} {}: {}", CROSS, style(step_name).red(), style(error).dim()),
        RunEvent::PipelineFinished { run_id, state } => format!(
            "{} Pipeline ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_run_state(*state)
        ),
    }
}

/// Shows a spinner while each step runs
#[derive(Default)]
pub struct ProgressReporter {
    current: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, event: &RunEvent) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        match event {
            RunEvent::StepStarted { step_name, .. } => {
                if let Some(previous) = current.take() {
                    previous.finish_and_clear();
                }
                *current = Some(create_spinner(format!("Running {}", style(step_name).cyan())));
            }
            _ => {
                if let Some(spinner) = current.take() {
                    spinner.finish_and_clear();
                }
                println!("{}", format_run_event(event));
            }
        }
    }
}

/// Format one memory match for display
pub fn format_memory_match(rank: usize, item: &MemoryMatch) -> String {
    let topic = item.metadata.get("topic").map(String::as_str).unwrap_or("?");
    let mut text = format!(
        "{}. {} {} {}",
        rank,
        style(topic).bold(),
        style(format!("similarity {:.2}", item.similarity())).cyan(),
        style(&item.id).dim()
    );
    if let Some(link) = item.metadata.get("store_link").filter(|l| !l.is_empty()) {
        text.push_str(&format!("\n   {}", style(link).underlined()));
    }
    text
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
