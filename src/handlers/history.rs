//! Handler for the `history` command.

use super::status_icon;
use anyhow::Result;
use colored::Colorize;
use nudge::engine::db::Db;
use nudge::engine::history::HistoryRepo;

/// Displays the recorded snapshot changes, newest first.
///
/// # Errors
/// Returns error if database query fails.
pub fn handle(limit: usize) -> Result<()> {
    let conn = Db::connect()?;
    let repo = HistoryRepo::new(&conn);

    let history = repo.recent(limit)?;

    println!("{} Status History (last {})", "📜".cyan(), limit);
    println!();

    if history.is_empty() {
        println!("   (No history recorded yet)");
        return Ok(());
    }

    for entry in history {
        let snapshot = &entry.snapshot;
        let mut flags = Vec::new();
        if snapshot.nagging_enabled {
            flags.push("nagging");
        }
        if snapshot.downtime_enabled {
            flags.push("downtime");
        }

        println!(
            "   {}  {}  {}  {}",
            entry.recorded_at.dimmed(),
            status_icon(snapshot.status),
            snapshot.message.bold(),
            flags.join(", ").yellow()
        );
    }

    Ok(())
}
