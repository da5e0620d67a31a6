//! stackup CLI - bootstrap a local monitoring stack for Cloud Spanner
//!
//! Usage: stackup [OPTIONS] [COMMAND]
//!
//! Without a command: check prerequisites, collect the target database and
//! credentials, write the configuration, start the stack and probe it.
//!
//! Commands:
//!   status   Show container status and probe service health
//!   down     Stop the stack
//!   restart  Restart all services or one of them
//!   logs     Show service logs

mod cli;
mod commands;
mod ui;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use ui::context::UiContext;
use ui::output::Reporter;

/// Overrides the `-v` derived filter, e.g. `STACKUP_LOG=stackup=trace`.
const LOG_ENV: &str = "STACKUP_LOG";

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    let ui = UiContext::new(cli.verbose, cli.color);
    let reporter = Reporter::new(ui);

    if let Err(err) = ctrlc::set_handler(move || {
        reporter.error("Interrupted");
        std::process::exit(130);
    }) {
        tracing::debug!(%err, "could not install interrupt handler");
    }

    if let Err(err) = run(&cli, &reporter) {
        ui::error::print_error(&err, ui.color, ui.unicode);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, reporter: &Reporter) -> Result<()> {
    let work_dir = cli.work_dir.as_deref();

    match &cli.command {
        None if cli.cleanup => commands::lifecycle::cmd_cleanup(reporter, work_dir, cli.use_docker),
        None => commands::setup::cmd_setup(cli, reporter),
        Some(Commands::Status) => commands::lifecycle::cmd_status(reporter, work_dir, cli.use_docker),
        Some(Commands::Down) => commands::lifecycle::cmd_down(reporter, work_dir, cli.use_docker),
        Some(Commands::Restart { service }) => {
            commands::lifecycle::cmd_restart(reporter, work_dir, cli.use_docker, service.as_deref())
        }
        Some(Commands::Logs { service, follow }) => commands::lifecycle::cmd_logs(
            reporter,
            work_dir,
            cli.use_docker,
            service.as_deref(),
            *follow,
        ),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("stackup={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
