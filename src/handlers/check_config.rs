//! Handler for the `check-config` command.

use super::load_config;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Loads and validates the configuration, then summarizes it.
///
/// # Errors
/// Returns error if the configuration cannot be loaded or is invalid.
pub fn handle(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let rules = &config.rules;

    println!("{} Configuration OK", "✓".green());
    println!("   Custom status rules: {}", rules.custom_state_rules.len());
    println!("   Nagging conditions:  {}", rules.nagging_conditions.len());
    println!("   Downtime conditions: {}", rules.downtime_conditions.len());
    println!(
        "   Poll interval:       {}",
        format!("{}s", config.settings.poll_interval_secs).dimmed()
    );

    let state_dependent = rules
        .nagging_conditions
        .iter()
        .chain(&rules.downtime_conditions)
        .filter(|c| c.reads_tasks_state())
        .count();
    if state_dependent > 0 {
        println!(
            "   {} {} nagging/downtime condition(s) read task facts and never match while tasks cannot be fetched",
            "ℹ".cyan(),
            state_dependent
        );
    }
    Ok(())
}
