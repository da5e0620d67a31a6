//! Run configuration
//!
//! Precedence, highest first:
//! 1. CLI flags
//! 2. Environment variables (`SPANNER_*`, `USE_DOCKER`, `DEV_MODE`, `COMPOSE_CMD`, `STACKUP_WORK_DIR`)
//! 3. `stackup.toml` in the working directory
//! 4. Built-in defaults
//!
//! Interactive prompts fill whatever is still missing; see `collect`.

pub mod env_validator;
mod loader;
#[cfg(test)]
mod tests;
mod types;

pub use loader::ConfigWarning;
pub use types::{
    CollectorProbePolicy, CredentialRef, Engine, EnvOverrides, HealthConfig, ImagesConfig,
    RunConfig, RuntimeSelection, Settings, StartupConfig, TargetIdentity, DEV_COLLECTOR_IMAGE,
    RELEASED_COLLECTOR_IMAGE,
};
