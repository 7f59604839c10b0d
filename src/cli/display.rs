//! Terminal display for cycle transitions
//!
//! Renders committed transitions and stalled stages as colored lines.
//! All output goes to stderr so stdout remains clean for piping.

use colored::Colorize;
use serde::Serialize;

const MAX_STATE_WIDTH: usize = 120;

/// Display handler for a running cycle
pub struct StageDisplay {
    stage_count: usize,
}

impl StageDisplay {
    /// Create a display for a cycle with `stage_count` stages
    #[must_use]
    pub const fn new(stage_count: usize) -> Self {
        Self { stage_count }
    }

    /// Print the header at the start of a run
    pub fn print_header(&self, stages: &[String], interval_ms: u64) {
        eprintln!(
            "\n{} {}",
            "===".bold().cyan(),
            format!("Cycle: {}", stages.join(" -> ")).bold().cyan()
        );
        let pacing = if interval_ms == 0 {
            "manual stepping".to_string()
        } else {
            format!("every {interval_ms}ms")
        };
        eprintln!("  {} {} stages, {pacing}", "Run:".dimmed(), self.stage_count);
        eprintln!("{}", "─".repeat(50).dimmed());
    }

    /// Render a committed transition
    pub fn render_transition<S: Serialize>(&self, state: &S, stage: &str) {
        eprintln!(
            "  {} {} {}",
            "▶".blue(),
            stage.bold(),
            summarize_state(state).dimmed()
        );
    }

    /// Render a stalled stage
    pub fn render_stall(&self, error: &anyhow::Error, stage: &str) {
        eprintln!(
            "  {} {} {}",
            "✗".red().bold(),
            stage.bold(),
            format!("{error:#}").red()
        );
    }
}

/// Render a state as a single line of JSON, truncated if very long
fn summarize_state<S: Serialize>(state: &S) -> String {
    let rendered =
        serde_json::to_string(state).unwrap_or_else(|_| "<unserializable state>".to_string());
    if rendered.chars().count() > MAX_STATE_WIDTH {
        let short: String = rendered.chars().take(MAX_STATE_WIDTH - 3).collect();
        format!("{short}...")
    } else {
        rendered
    }
}
