//! seatwatch - automated seat acquisition for CAS-gated course selection.
//!
//! This is a thin wrapper over the seatwatch libraries: it loads the JSON
//! configuration, assembles the solver/notifier/client stack, and runs the
//! acquisition scheduler until the watch list drains or the process is
//! interrupted.

mod cli;
mod config;
mod notify;
mod solver;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use seatwatch_cas::CasSession;
use seatwatch_core::{ChallengeSolver, LogNotifier, NoopSolver, Notifier};
use seatwatch_enroll::{EnrollmentClient, Scheduler, SchedulerConfig};

use cli::Cli;
use config::Config;
use notify::WebhookNotifier;
use solver::CommandSolver;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.json_logs);

    let config = Config::load(&cli.config)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        courses = config.courses.len(),
        "seatwatch starting"
    );

    let solver: Box<dyn ChallengeSolver> = match &config.solver_command {
        Some(command) => Box::new(CommandSolver::new(command)?),
        None => Box::new(NoopSolver),
    };
    let notifier: Box<dyn Notifier> = match &config.webhook {
        Some(webhook) => Box::new(WebhookNotifier::new(webhook)),
        None => Box::new(LogNotifier),
    };

    let cas = CasSession::new(config.portal()?, config.credentials(), solver);
    let client = EnrollmentClient::new(cas, config.service()?);

    let scheduler_config = SchedulerConfig {
        poll_interval: config.poll_interval(),
        refresh_cadence: config.refresh_cadence,
        dry_run: cli.dry_run,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    Scheduler::new(
        Box::new(client),
        notifier,
        config.watch_list()?,
        scheduler_config,
    )
    .with_shutdown(shutdown_rx)
    .run()
    .await;

    Ok(())
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}
