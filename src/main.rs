mod handlers;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nudge", version, about = "Keeps your current task in front of you")]
struct Cli {
    /// Path to the TOML configuration (default: ./nudge.toml if present)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Initialize the status history database
    Init,
    /// Evaluate the rules once against a task file
    Eval {
        /// JSON file with the current task list
        #[arg(long, short = 't')]
        tasks: PathBuf,
        /// Evaluate at this local time instead of now (YYYY-MM-DDTHH:MM[:SS])
        #[arg(long, value_parser = parse_local_time)]
        at: Option<NaiveDateTime>,
        #[arg(long)]
        json: bool,
    },
    /// Poll a task file and report status changes
    Watch {
        /// JSON file with the current task list
        #[arg(long, short = 't')]
        tasks: PathBuf,
        /// Seconds between polls (default: settings.poll_interval_secs)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many polls
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Validate the configuration file
    CheckConfig,
    /// Show recorded status changes
    History {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn parse_local_time(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| format!("expected YYYY-MM-DDTHH:MM[:SS], got '{value}'"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nudge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init => handlers::init::handle(),
        Commands::Eval { tasks, at, json } => handlers::eval::handle(config, &tasks, at, json),
        Commands::Watch {
            tasks,
            interval,
            iterations,
        } => handlers::watch::handle(config, &tasks, interval, iterations),
        Commands::CheckConfig => handlers::check_config::handle(config),
        Commands::History { limit } => handlers::history::handle(limit),
    }
}
