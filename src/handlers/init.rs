//! Handler for the `init` command.

use anyhow::Result;
use colored::Colorize;
use nudge::engine::db::Db;

/// Creates the snapshot history database.
///
/// # Errors
/// Returns error if database initialization fails.
pub fn handle() -> Result<()> {
    let path = Db::init()?;
    println!("{} Initialized {}", "✓".green(), path.display());
    Ok(())
}
