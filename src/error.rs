//! Error types for stackup
//!
//! Fatal conditions are `StackupError` values and end the run. Conditions the
//! run survives are reported through [`StepOutcome`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stackup operations
pub type StackupResult<T> = Result<T, StackupError>;

/// Fatal errors. Any of these terminates the run with exit code 1.
#[derive(Error, Debug)]
pub enum StackupError {
    /// One or more required external tools are not on PATH
    #[error("missing required tools: {}", tools.join(", "))]
    MissingTools { tools: Vec<String> },

    /// Neither podman nor docker was found
    #[error(
        "no container runtime found (tried {}). Install podman: https://podman.io/docs/installation \
         or docker: https://docs.docker.com/get-docker/",
        tried.join(", ")
    )]
    NoContainerRuntime { tried: Vec<String> },

    /// The selected runtime has no usable compose implementation
    #[error("{runtime} is installed but no compose implementation was found ({hint})")]
    ComposeMissing { runtime: String, hint: String },

    /// The provided service account key file does not exist
    #[error("service account key file not found: {path}")]
    CredentialFileMissing { path: PathBuf },

    /// gcloud is required to provision a service account
    #[error("gcloud CLI not found; install it from https://cloud.google.com/sdk/docs/install")]
    ProvisioningCliMissing,

    /// Required identifiers are still empty after collection
    #[error("missing required identifiers: {}", missing.join(", "))]
    MissingIdentifiers { missing: Vec<&'static str> },

    /// An identifier holds characters Google Cloud never issues
    #[error("invalid {name} ID '{value}': only {allowed} are allowed")]
    InvalidIdentifier {
        name: &'static str,
        value: String,
        allowed: String,
    },

    /// A rendered artifact failed validation before being written
    #[error("rendered {path} is invalid: {message}")]
    InvalidArtifact { path: PathBuf, message: String },

    /// `stackup.toml` could not be parsed or holds contradictory values
    #[error("invalid configuration in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// A compose invocation exited unsuccessfully
    #[error("`{command}` failed{}", code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    ComposeFailed { command: String, code: Option<i32> },

    /// Building the development collector image failed
    #[error("building the development collector image failed: {0}")]
    BuildFailed(String),

    /// Cloning the collector sources failed and no previous copy exists
    #[error("cloning {url} failed: {message}")]
    CloneFailed { url: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a step that can degrade without failing the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step completed as intended
    #[default]
    Done,
    /// The step completed in a degraded way; each entry is one warning
    Recovered { warnings: Vec<String> },
}

impl StepOutcome {
    pub fn warning(message: impl Into<String>) -> Self {
        StepOutcome::Recovered {
            warnings: vec![message.into()],
        }
    }

    /// Record another warning on this outcome.
    pub fn warn(&mut self, message: impl Into<String>) {
        match self {
            StepOutcome::Done => *self = StepOutcome::warning(message),
            StepOutcome::Recovered { warnings } => warnings.push(message.into()),
        }
    }

    pub fn merge(mut self, other: StepOutcome) -> Self {
        for w in other.warnings() {
            self.warn(w.clone());
        }
        self
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            StepOutcome::Done => &[],
            StepOutcome::Recovered { warnings } => warnings,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_tools_names_all() {
        let err = StackupError::MissingTools {
            tools: vec!["git".to_string(), "curl".to_string()],
        };
        assert_eq!(err.to_string(), "missing required tools: git, curl");
    }

    #[test]
    fn test_error_display_no_runtime_has_install_links() {
        let err = StackupError::NoContainerRuntime {
            tried: vec!["podman".to_string(), "docker".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("podman, docker"));
        assert!(msg.contains("https://podman.io"));
        assert!(msg.contains("https://docs.docker.com"));
    }

    #[test]
    fn test_error_display_compose_failed() {
        let err = StackupError::ComposeFailed {
            command: "podman-compose up -d".to_string(),
            code: Some(125),
        };
        assert_eq!(
            err.to_string(),
            "`podman-compose up -d` failed with exit code 125"
        );

        let err = StackupError::ComposeFailed {
            command: "docker compose down".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "`docker compose down` failed");
    }

    #[test]
    fn step_outcome_accumulates_warnings() {
        let mut outcome = StepOutcome::Done;
        assert!(outcome.is_done());

        outcome.warn("first");
        outcome.warn("second");
        assert_eq!(outcome.warnings(), ["first", "second"]);

        let merged = StepOutcome::Done.merge(outcome);
        assert_eq!(merged.warnings().len(), 2);
    }
}
