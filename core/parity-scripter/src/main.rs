//! parity-scripter: stop containers while an Unraid parity check runs.
//!
//! Polls the emhttp status file and, on each parity transition, runs one of
//! two action lists built from the configured containers:
//!
//! - parity started/resumed → stop every container
//! - parity stopped/paused  → start every container
//!
//! Runs until killed.

mod backoff;
mod logging;
mod monitor;

use clap::Parser;
use parity_core::containers::DEFAULT_DOCKER_PROGRAM;
use parity_core::notify::{DEFAULT_NOTIFY_EVENT, DEFAULT_NOTIFY_SCRIPT};
use parity_core::status::DEFAULT_STATUS_FILE;
use parity_core::{
    ActionPlan, Config, ContainerDispatcher, DockerCli, FileStatusSource, Notifier, NullNotifier,
    UnraidNotifier,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use logging::LogFormat;
use monitor::{Monitor, MonitorSettings};

#[derive(Parser)]
#[command(name = "parity-scripter")]
#[command(about = "Stop containers while an Unraid parity check runs")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, value_name = "PATH")]
    config: PathBuf,

    /// Log output format
    #[arg(short, long, value_enum, default_value_t = LogFormat::Full)]
    format: LogFormat,

    /// Seconds between parity status checks
    #[arg(
        short,
        long,
        value_name = "SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    sleep: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Array status file written by emhttp
    #[arg(long, value_name = "PATH", default_value = DEFAULT_STATUS_FILE)]
    status_file: PathBuf,

    /// Container command used to start and stop containers
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_DOCKER_PROGRAM)]
    docker: String,

    /// Notification script used for web UI notifications
    #[arg(long, value_name = "PATH", default_value = DEFAULT_NOTIFY_SCRIPT)]
    notify_script: PathBuf,

    /// Do not send web UI notifications
    #[arg(long)]
    no_notify: bool,

    /// Exit on the first unreadable status instead of retrying
    #[arg(long)]
    fail_fast: bool,
}

fn main() {
    let cli = Cli::parse();

    let _logging_guard = match logging::init(cli.format, cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("parity-scripter: {}", err);
            std::process::exit(1);
        }
    };

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load config");
            std::process::exit(1);
        }
    };
    if config.containers.is_empty() {
        warn!(
            path = %cli.config.display(),
            "No containers configured; transitions will only be logged"
        );
    }
    info!(containers = ?config.containers, "Loaded config");

    let notifier: Box<dyn Notifier> = if cli.no_notify {
        Box::new(NullNotifier)
    } else {
        Box::new(UnraidNotifier::new(cli.notify_script, DEFAULT_NOTIFY_EVENT))
    };

    let dispatcher = ContainerDispatcher::new(DockerCli::new(cli.docker), &*notifier);
    let mut monitor = Monitor::new(
        FileStatusSource::new(cli.status_file),
        dispatcher,
        &*notifier,
        ActionPlan::from_containers(&config.containers),
        MonitorSettings {
            interval: Duration::from_secs(cli.sleep),
            fail_fast: cli.fail_fast,
        },
    );

    monitor.announce();
    if let Err(err) = monitor.run() {
        error!(error = %err, "parity-scripter stopped");
        std::process::exit(1);
    }
}
