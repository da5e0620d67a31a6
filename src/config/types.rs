//! Configuration type definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StackupError, StackupResult};

use super::env_validator::EnvVarValidator;
use super::loader::{self, ConfigWarning};

/// Pinned released collector image.
pub const RELEASED_COLLECTOR_IMAGE: &str = "otel/opentelemetry-collector-contrib:0.115.0";
/// Image tag produced by the dev-mode build.
pub const DEV_COLLECTOR_IMAGE: &str = "otelcol-spanner:dev";

/// Container images used by the compose file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_collector_image")]
    pub collector: String,

    #[serde(default = "default_collector_dev_image")]
    pub collector_dev: String,

    #[serde(default = "default_prometheus_image")]
    pub prometheus: String,

    #[serde(default = "default_grafana_image")]
    pub grafana: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            collector: default_collector_image(),
            collector_dev: default_collector_dev_image(),
            prometheus: default_prometheus_image(),
            grafana: default_grafana_image(),
        }
    }
}

fn default_collector_image() -> String {
    RELEASED_COLLECTOR_IMAGE.to_string()
}

fn default_collector_dev_image() -> String {
    DEV_COLLECTOR_IMAGE.to_string()
}

fn default_prometheus_image() -> String {
    "prom/prometheus:v2.54.1".to_string()
}

fn default_grafana_image() -> String {
    "grafana/grafana:11.2.0".to_string()
}

/// Startup behaviour after `compose up`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupConfig {
    /// Flat delay before probing, in seconds
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            wait_secs: default_wait_secs(),
        }
    }
}

fn default_wait_secs() -> u64 {
    30
}

/// How a failing collector metrics probe is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorProbePolicy {
    /// Failure is a warning only
    #[default]
    Advisory,
    /// Failure fails the health verdict like the other probes
    Required,
}

/// Health probe configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default)]
    pub collector_probe: CollectorProbePolicy,

    /// Per-request timeout; unset leaves the HTTP client default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Contents of the optional `stackup.toml`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub startup: StartupConfig,

    #[serde(default)]
    pub health: HealthConfig,
}

impl Settings {
    /// File name looked up in the working directory.
    pub const FILE_NAME: &'static str = "stackup.toml";

    /// Load and validate a settings file.
    pub fn load(path: &Path) -> StackupResult<Self> {
        loader::load_with_warnings(path).map(|(settings, _)| settings)
    }

    /// Load `stackup.toml` from `work_dir`, or defaults when absent.
    pub fn load_or_default(work_dir: &Path) -> StackupResult<(Self, Vec<ConfigWarning>)> {
        let path = work_dir.join(Self::FILE_NAME);
        if !path.exists() {
            return Ok((Self::default(), Vec::new()));
        }
        loader::load_with_warnings(&path)
    }

    /// Reject settings that would make the released and dev images collide.
    pub fn validate(&self, file: &Path) -> StackupResult<()> {
        if self.images.collector == self.images.collector_dev {
            return Err(StackupError::InvalidConfig {
                file: file.to_path_buf(),
                message: format!(
                    "images.collector and images.collector_dev are both '{}'",
                    self.images.collector
                ),
            });
        }
        Ok(())
    }
}

/// Values read from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub project_id: Option<String>,
    pub instance_id: Option<String>,
    pub database_id: Option<String>,
    pub work_dir: Option<PathBuf>,
    pub use_docker: Option<bool>,
    pub dev_mode: Option<bool>,
    pub compose_cmd: Option<String>,
}

impl EnvOverrides {
    pub const PROJECT_VAR: &'static str = "SPANNER_PROJECT_ID";
    pub const INSTANCE_VAR: &'static str = "SPANNER_INSTANCE_ID";
    pub const DATABASE_VAR: &'static str = "SPANNER_DATABASE_ID";
    pub const WORK_DIR_VAR: &'static str = "STACKUP_WORK_DIR";
    pub const USE_DOCKER_VAR: &'static str = "USE_DOCKER";
    pub const DEV_MODE_VAR: &'static str = "DEV_MODE";
    pub const COMPOSE_CMD_VAR: &'static str = "COMPOSE_CMD";

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup; empty values count as unset.
    pub fn from_lookup(get_env: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| get_env(key).filter(|v| !v.trim().is_empty());
        let get_bool = |key: &str| {
            get(key).map(|v| EnvVarValidator::boolean(key).parse_bool(&v, false))
        };

        Self {
            project_id: get(Self::PROJECT_VAR),
            instance_id: get(Self::INSTANCE_VAR),
            database_id: get(Self::DATABASE_VAR),
            work_dir: get(Self::WORK_DIR_VAR).map(PathBuf::from),
            use_docker: get_bool(Self::USE_DOCKER_VAR),
            dev_mode: get_bool(Self::DEV_MODE_VAR),
            compose_cmd: get(Self::COMPOSE_CMD_VAR),
        }
    }

    /// The identity triple, only when all three variables are set.
    pub fn complete_identity(&self) -> Option<(String, String, String)> {
        match (&self.project_id, &self.instance_id, &self.database_id) {
            (Some(p), Some(i), Some(d)) => Some((p.clone(), i.clone(), d.clone())),
            _ => None,
        }
    }
}

/// The Spanner database being monitored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetIdentity {
    pub project_id: String,
    pub instance_id: String,
    pub database_id: String,
}

/// Where the collector gets its Google credentials from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRef {
    /// A service account key file on the host
    KeyFile(PathBuf),
    /// Application Default Credentials from the host gcloud configuration
    Ambient,
}

impl CredentialRef {
    pub fn key_file(&self) -> Option<&Path> {
        match self {
            CredentialRef::KeyFile(path) => Some(path),
            CredentialRef::Ambient => None,
        }
    }
}

/// Container engine behind the compose command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Podman,
    Docker,
}

impl Engine {
    pub fn binary(self) -> &'static str {
        match self {
            Engine::Podman => "podman",
            Engine::Docker => "docker",
        }
    }
}

/// The compose invocation chosen for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSelection {
    pub engine: Engine,
    pub program: String,
    pub args: Vec<String>,
}

impl RuntimeSelection {
    pub fn new(engine: Engine, program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            engine,
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Parse a user supplied override such as `"docker compose"`.
    pub fn from_override(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next()?.to_string();
        let engine = if program.contains("podman") {
            Engine::Podman
        } else {
            Engine::Docker
        };
        Some(Self {
            engine,
            program,
            args: parts.map(str::to_string).collect(),
        })
    }

    /// Command line as written into `.env` and helper scripts.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything a run needs, built once after collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub work_dir: PathBuf,
    pub identity: TargetIdentity,
    pub credentials: CredentialRef,
    pub service_account_email: Option<String>,
    pub runtime: RuntimeSelection,
    pub dev_mode: bool,
    /// Host gcloud configuration directory mounted for ambient credentials
    pub gcloud_config_dir: Option<PathBuf>,
    pub settings: Settings,
}

impl RunConfig {
    /// Collector image for this run: the local build in dev mode, else the pinned release.
    pub fn collector_image(&self) -> &str {
        if self.dev_mode {
            &self.settings.images.collector_dev
        } else {
            &self.settings.images.collector
        }
    }
}
