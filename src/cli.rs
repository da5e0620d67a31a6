//! CLI argument parsing
//!
//! Without a subcommand stackup runs the full setup flow; the subcommands
//! operate on a stack that is already configured.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// stackup - bootstrap a local monitoring stack for a Cloud Spanner database
#[derive(Parser, Debug)]
#[command(name = "stackup")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Run 'stackup' without a subcommand to set up and launch the stack.")]
pub struct Cli {
    /// Google Cloud project ID
    #[arg(long)]
    pub project: Option<String>,

    /// Spanner instance ID
    #[arg(long)]
    pub instance: Option<String>,

    /// Spanner database ID
    #[arg(long)]
    pub database: Option<String>,

    /// Existing service account key file (skips the credentials menu)
    #[arg(long, value_name = "PATH")]
    pub service_account_key: Option<PathBuf>,

    /// Service account email for the Cloud Monitoring datasource
    #[arg(long, value_name = "EMAIL")]
    pub service_account_email: Option<String>,

    /// Build the collector from source instead of using the released image
    #[arg(long)]
    pub dev_mode: bool,

    /// Prefer docker over podman
    #[arg(long)]
    pub use_docker: bool,

    /// Dev mode: reuse the existing source checkout
    #[arg(long)]
    pub skip_clone: bool,

    /// Dev mode: reuse the previously built image
    #[arg(long)]
    pub skip_build: bool,

    /// Stop the stack, remove its volumes and everything stackup generated
    #[arg(long, conflicts_with_all = ["dev_mode", "skip_clone", "skip_build"])]
    pub cleanup: bool,

    /// Directory holding the generated files (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Color output mode
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorWhen>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show container status and probe service health
    Status,

    /// Stop the stack
    Down,

    /// Restart all services or one of them
    Restart {
        /// Service name (otel-collector, prometheus, grafana)
        service: Option<String>,
    },

    /// Show service logs
    Logs {
        /// Service name (otel-collector, prometheus, grafana)
        service: Option<String>,

        /// Keep streaming new output
        #[arg(short, long)]
        follow: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_subcommand_runs_setup() {
        let cli = Cli::try_parse_from(["stackup"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.cleanup);
    }

    #[test]
    fn test_cli_identity_flags() {
        let cli = Cli::try_parse_from([
            "stackup",
            "--project",
            "p1",
            "--instance",
            "i1",
            "--database",
            "d1",
            "--service-account-key",
            "key.json",
        ])
        .unwrap();

        assert_eq!(cli.project.as_deref(), Some("p1"));
        assert_eq!(cli.instance.as_deref(), Some("i1"));
        assert_eq!(cli.database.as_deref(), Some("d1"));
        assert_eq!(cli.service_account_key, Some(PathBuf::from("key.json")));
    }

    #[test]
    fn test_cli_dev_mode_flags() {
        let cli =
            Cli::try_parse_from(["stackup", "--dev-mode", "--skip-clone", "--use-docker"]).unwrap();
        assert!(cli.dev_mode);
        assert!(cli.skip_clone);
        assert!(!cli.skip_build);
        assert!(cli.use_docker);
    }

    #[test]
    fn test_cli_cleanup_conflicts_with_dev_mode() {
        assert!(Cli::try_parse_from(["stackup", "--cleanup", "--dev-mode"]).is_err());
    }

    #[test]
    fn test_cli_logs_subcommand() {
        let cli = Cli::try_parse_from(["stackup", "logs", "grafana", "-f"]).unwrap();
        match cli.command {
            Some(Commands::Logs { service, follow }) => {
                assert_eq!(service.as_deref(), Some("grafana"));
                assert!(follow);
            }
            other => panic!("Expected Logs command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["stackup", "status", "--color", "never", "-vv"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status)));
        assert_eq!(cli.color, Some(ColorWhen::Never));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_unknown_flag_is_error() {
        assert!(Cli::try_parse_from(["stackup", "--frobnicate"]).is_err());
    }
}
