//! Handler for the `watch` command.

use super::{load_config, poll, print_snapshot};
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use colored::Colorize;
use nudge::engine::db::Db;
use nudge::engine::history::HistoryRepo;
use nudge::engine::types::{SnapshotChange, Transition};
use nudge::{StandardMatcher, StatusAggregator, StatusSnapshot};
use rusqlite::Connection;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Polls the task file and reports every change in the derived status.
///
/// # Errors
/// Returns error if the configuration is invalid, a condition fails, or the
/// history database cannot be written.
pub fn handle(
    config_path: Option<&Path>,
    tasks: &Path,
    interval_secs: Option<u64>,
    iterations: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let interval = Duration::from_secs(
        interval_secs
            .unwrap_or(config.settings.poll_interval_secs)
            .max(1),
    );
    let history = if config.settings.history {
        open_history()
    } else {
        None
    };

    let aggregator = StatusAggregator::new(StandardMatcher::new(), config.rules);
    let mut previous = aggregator.snapshot();
    let mut cycle: u64 = 0;

    println!(
        "{} Watching {} every {}s",
        "👀".cyan(),
        tasks.display(),
        interval.as_secs()
    );

    loop {
        let now = Local::now().naive_local();
        poll(&aggregator, tasks, now)?;
        let current = aggregator.snapshot();

        match reportable_change(&previous, &current, cycle == 0) {
            Some(change) => {
                report(&current, change);
                if let Some(conn) = &history {
                    record(conn, &current, now)?;
                }
            }
            None => debug!("status unchanged"),
        }
        previous = current;

        cycle += 1;
        if iterations.is_some_and(|n| cycle >= n) {
            return Ok(());
        }
        thread::sleep(interval);
    }
}

/// Decides whether a poll result is worth reporting.
///
/// The first poll is always reported. Its change is still computed against
/// the aggregator's initial snapshot, so flags already on count as started.
fn reportable_change(
    previous: &StatusSnapshot,
    current: &StatusSnapshot,
    first: bool,
) -> Option<SnapshotChange> {
    let change = current.changes_from(previous);
    (first || !change.is_empty()).then_some(change)
}

fn open_history() -> Option<Connection> {
    match Db::connect() {
        Ok(conn) => Some(conn),
        Err(e) => {
            warn!("{e:#}; history will not be recorded");
            None
        }
    }
}

/// Appends the snapshot unless it repeats the last recorded one, which
/// happens on the first poll after a restart.
fn record(conn: &Connection, snapshot: &StatusSnapshot, now: NaiveDateTime) -> Result<bool> {
    let repo = HistoryRepo::new(conn);
    if repo
        .latest()?
        .is_some_and(|entry| entry.snapshot == *snapshot)
    {
        debug!("snapshot already recorded");
        return Ok(false);
    }
    let id = repo.record(snapshot, now)?;
    debug!(id, "snapshot recorded");
    Ok(true)
}

fn report(snapshot: &StatusSnapshot, change: SnapshotChange) {
    print_snapshot(snapshot);

    match change.nagging {
        Some(Transition::Started) => {
            info!(task = %snapshot.message, "nagging started");
            println!("   {} Time to get back to: {}", "🔔".yellow(), snapshot.message);
        }
        Some(Transition::Stopped) => info!("nagging stopped"),
        None => {}
    }
    match change.downtime {
        Some(Transition::Started) => info!("downtime started"),
        Some(Transition::Stopped) => info!("downtime ended"),
        None => {}
    }
}
