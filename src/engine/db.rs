use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

const DB_DIR: &str = ".nudge";
const DB_FILE: &str = "history.db";

pub struct Db;

impl Db {
    /// Path of the history database relative to the working directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        Path::new(DB_DIR).join(DB_FILE)
    }

    /// Initializes the .nudge directory and `SQLite` database schema.
    ///
    /// # Errors
    /// Returns error if directory creation, DB opening, or migration fails.
    pub fn init() -> Result<PathBuf> {
        if !Path::new(DB_DIR).exists() {
            fs::create_dir(DB_DIR).context("Failed to create .nudge directory")?;
        }
        let db_path = Self::default_path();
        Self::open_at(&db_path)?;
        Ok(db_path)
    }

    /// Connects to the existing history database.
    ///
    /// # Errors
    /// Returns error if the database file does not exist or cannot be opened.
    pub fn connect() -> Result<Connection> {
        let db_path = Self::default_path();
        if !db_path.exists() {
            anyhow::bail!("History not initialized. Run `nudge init` first.");
        }
        Self::open_at(&db_path)
    }

    /// Opens (creating if needed) a database at `path` and applies the schema.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Connection> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::migrate(&conn)?;
        Ok(conn)
    }

    /// Applies the schema migrations.
    fn migrate(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY,
                status TEXT NOT NULL,
                message TEXT NOT NULL,
                nagging INTEGER NOT NULL,
                downtime INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create snapshots table")?;

        Ok(())
    }
}
