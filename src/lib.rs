//! stackup - local Spanner monitoring stack bootstrapper
//!
//! Checks prerequisites, collects the target database and credentials,
//! renders the OpenTelemetry collector, compose, Prometheus and Grafana
//! configuration, launches the stack and probes it once for health.

pub mod collect;
pub mod config;
pub mod error;
pub mod fs;
pub mod launch;
pub mod lifecycle;
pub mod prereq;
pub mod process;
pub mod render;
pub mod scripts;
pub mod source;

// Re-exports for convenience
pub use collect::{resolve_credentials, resolve_identity, IdentityFlags, Prompter};
pub use config::{ConfigWarning, RunConfig, Settings};
pub use error::{StackupError, StackupResult, StepOutcome};
pub use launch::{probe_all, start_services, HealthReport, HttpProbe, UreqProbe};
pub use prereq::{check_required_tools, resolve_runtime, RuntimePreferences, REQUIRED_TOOLS};
pub use process::{CommandRunner, PathProbe, SystemRunner, ToolProbe};
pub use render::{generate, render_artifacts, ArtifactKind, ArtifactSet, GenerateReport};
pub use scripts::emit_helper_scripts;
