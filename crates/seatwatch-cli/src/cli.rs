//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Seat watcher for CAS-gated course enrollment.
#[derive(Parser, Debug)]
#[command(name = "seatwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "seatwatch.json")]
    pub config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Poll and notify, but never submit an add request
    #[arg(long)]
    pub dry_run: bool,
}
