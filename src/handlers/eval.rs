//! Handler for the `eval` command.

use super::{load_config, poll, print_snapshot};
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use nudge::{StandardMatcher, StatusAggregator};
use std::path::Path;

/// Evaluates the rules once against a task file and prints the snapshot.
///
/// # Errors
/// Returns error if the configuration is invalid or a condition fails.
pub fn handle(
    config_path: Option<&Path>,
    tasks: &Path,
    at: Option<NaiveDateTime>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let now = at.unwrap_or_else(|| Local::now().naive_local());

    let aggregator = StatusAggregator::new(StandardMatcher::new(), config.rules);
    poll(&aggregator, tasks, now)?;
    let snapshot = aggregator.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_snapshot(&snapshot);
    Ok(())
}
