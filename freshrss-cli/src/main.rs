//! freshrss-charm: drive the FreshRSS unit reconciler from the command line.
//!
//! # Usage
//!
//! ```text
//! freshrss-charm [--state-dir DIR] reconcile [--trigger KIND] [--config FILE] [--world FILE]
//!                                            [--app-dir DIR] [--nginx-dir DIR] [--json]
//! freshrss-charm [--state-dir DIR] status [--json]
//! ```

mod adapters;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{reconcile::ReconcileArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "freshrss-charm",
    version,
    about = "Reconcile a FreshRSS unit towards its ready state",
    long_about = None,
)]
struct Cli {
    /// Directory holding unit state, relation data and leadership settings.
    /// Defaults to `<data-local-dir>/freshrss-charm`.
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one reconciliation pass for a framework trigger.
    Reconcile(ReconcileArgs),

    /// Show persisted flags and the acquired database connection.
    Status(StatusArgs),
}

fn default_state_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("could not determine local data directory")?;
    Ok(base.join("freshrss-charm"))
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let state_dir = match cli.state_dir {
        Some(dir) => dir,
        None => default_state_dir()?,
    };
    match cli.command {
        Commands::Reconcile(args) => args.run(&state_dir),
        Commands::Status(args) => args.run(&state_dir),
    }
}
