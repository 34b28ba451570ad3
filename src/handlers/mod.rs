//! Command handlers and the helpers they share.

pub mod check_config;
pub mod eval;
pub mod history;
pub mod init;
pub mod watch;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use colored::Colorize;
use nudge::engine::config::Config;
use nudge::engine::tasks::TaskFile;
use nudge::{Severity, StandardMatcher, StatusAggregator, StatusSnapshot, TasksState};
use std::path::Path;
use tracing::warn;

/// Loads and validates the configuration.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path).context("Failed to load configuration")?;
    config.validate().context("Configuration is invalid")?;
    Ok(config)
}

/// Runs one polling cycle: reads the task file and updates the aggregator.
///
/// A task file that cannot be read or parsed is treated as an upstream
/// fetch failure and surfaced through the snapshot, not returned.
///
/// # Errors
/// Returns error only if a condition fails to evaluate.
fn poll(
    aggregator: &StatusAggregator<StandardMatcher>,
    tasks: &Path,
    now: NaiveDateTime,
) -> Result<()> {
    match TaskFile::from_file(tasks) {
        Ok(file) => {
            let state = TasksState::from_tasks(&file.tasks, now);
            aggregator.update_from_tasks_state(&state, now)?;
        }
        Err(e) => {
            let message = format!("{e:#}");
            warn!(error = %message, "task fetch failed");
            aggregator.update_from_task_state_error(&message, now)?;
        }
    }
    Ok(())
}

fn status_icon(status: Severity) -> colored::ColoredString {
    match status {
        Severity::Ok => "✓".green(),
        Severity::Warning => "⚠".yellow(),
        Severity::Error => "✗".red(),
    }
}

fn print_snapshot(snapshot: &StatusSnapshot) {
    println!(
        "{} {} ({})",
        status_icon(snapshot.status),
        snapshot.message.bold(),
        snapshot.status.to_string().dimmed()
    );

    let flag = |on: bool| if on { "on".yellow() } else { "off".dimmed() };
    println!(
        "   Nagging: {}   Downtime: {}",
        flag(snapshot.nagging_enabled),
        flag(snapshot.downtime_enabled)
    );
}
