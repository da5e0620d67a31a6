//! Credential resolution and service account provisioning

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::Prompter;
use crate::config::CredentialRef;
use crate::error::{StackupError, StackupResult, StepOutcome};
use crate::process::{CommandOutput, CommandRunner, CommandSpec, ToolProbe};

/// Account id used when provisioning a new service account.
pub const SERVICE_ACCOUNT_NAME: &str = "spanner-otel-collector";
/// Where a newly created key is written, relative to the working directory.
pub const GENERATED_KEY_PATH: &str = "credentials/service-account.json";

const GRANTED_ROLES: [&str; 3] = [
    "roles/spanner.databaseReader",
    "roles/spanner.viewer",
    "roles/monitoring.viewer",
];

/// How the operator wants the collector to authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialChoice {
    Existing,
    Ambient,
    Create,
}

impl CredentialChoice {
    const MENU: [(&'static str, CredentialChoice); 3] = [
        (
            "Use an existing service account key file",
            CredentialChoice::Existing,
        ),
        (
            "Use Application Default Credentials (gcloud auth application-default login)",
            CredentialChoice::Ambient,
        ),
        (
            "Create a new service account with gcloud",
            CredentialChoice::Create,
        ),
    ];
}

/// Credential values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CredentialFlags {
    pub key: Option<PathBuf>,
    pub email: Option<String>,
}

/// The fields of a service account key file we care about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// Parse a service account key file.
pub fn read_service_account_key(path: &Path) -> StackupResult<ServiceAccountKey> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        StackupError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// Service account email: the explicit value, else `client_email` from the key.
pub fn resolve_email(key: Option<&Path>, explicit: Option<&str>) -> Option<String> {
    if let Some(email) = explicit.map(str::trim).filter(|e| !e.is_empty()) {
        return Some(email.to_string());
    }
    let key = key?;
    match read_service_account_key(key) {
        Ok(parsed) => parsed.client_email.filter(|e| !e.trim().is_empty()),
        Err(e) => {
            warn!(error = %e, "could not read client_email from key file");
            None
        }
    }
}

/// Resolve the credential reference for this run.
///
/// A `--service-account-key` flag skips the menu. Without a prompter the
/// collector falls back to ambient credentials.
pub fn resolve_credentials(
    flags: &CredentialFlags,
    project_id: &str,
    work_dir: &Path,
    prompter: Option<&dyn Prompter>,
    runner: &dyn CommandRunner,
    probe: &dyn ToolProbe,
) -> StackupResult<(CredentialRef, StepOutcome)> {
    if let Some(path) = &flags.key {
        return existing_key(path).map(|c| (c, StepOutcome::Done));
    }

    let Some(prompter) = prompter else {
        debug!("non-interactive run, using ambient credentials");
        return Ok((CredentialRef::Ambient, StepOutcome::Done));
    };

    let items: Vec<&str> = CredentialChoice::MENU.iter().map(|(label, _)| *label).collect();
    let index = prompter.select("How should the collector authenticate?", &items, 1)?;
    let choice = CredentialChoice::MENU
        .get(index)
        .map(|(_, c)| *c)
        .unwrap_or(CredentialChoice::Ambient);

    match choice {
        CredentialChoice::Existing => {
            let path = prompter.input("Path to service account key file")?;
            existing_key(Path::new(path.trim())).map(|c| (c, StepOutcome::Done))
        }
        CredentialChoice::Ambient => Ok((CredentialRef::Ambient, StepOutcome::Done)),
        CredentialChoice::Create => {
            let (key, mut outcome) = provision_service_account(runner, probe, project_id, work_dir)?;
            match key {
                Some(path) => Ok((CredentialRef::KeyFile(path), outcome)),
                None => {
                    outcome.warn("no key file was created; falling back to ambient credentials");
                    Ok((CredentialRef::Ambient, outcome))
                }
            }
        }
    }
}

fn existing_key(path: &Path) -> StackupResult<CredentialRef> {
    if !path.is_file() {
        return Err(StackupError::CredentialFileMissing {
            path: path.to_path_buf(),
        });
    }
    Ok(CredentialRef::KeyFile(std::path::absolute(path)?))
}

/// Create the collector service account, grant it read roles and download a key.
///
/// Only a missing gcloud is fatal. "Already exists" answers count as success;
/// any other failure becomes a warning.
pub fn provision_service_account(
    runner: &dyn CommandRunner,
    probe: &dyn ToolProbe,
    project_id: &str,
    work_dir: &Path,
) -> StackupResult<(Option<PathBuf>, StepOutcome)> {
    if !probe.has("gcloud") {
        return Err(StackupError::ProvisioningCliMissing);
    }

    let email = format!("{SERVICE_ACCOUNT_NAME}@{project_id}.iam.gserviceaccount.com");
    let mut outcome = StepOutcome::Done;

    let create = CommandSpec::new("gcloud").args([
        "iam",
        "service-accounts",
        "create",
        SERVICE_ACCOUNT_NAME,
        "--project",
        project_id,
        "--display-name",
        "Spanner OpenTelemetry collector",
    ]);
    record(&mut outcome, &create, gcloud(runner, &create)?);

    for role in GRANTED_ROLES {
        let member = format!("serviceAccount:{email}");
        let grant = CommandSpec::new("gcloud").args([
            "projects",
            "add-iam-policy-binding",
            project_id,
            "--member",
            member.as_str(),
            "--role",
            role,
            "--condition=None",
            "--quiet",
        ]);
        record(&mut outcome, &grant, gcloud(runner, &grant)?);
    }

    let key_path = work_dir.join(GENERATED_KEY_PATH);
    if let Some(parent) = key_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let key_arg = key_path.display().to_string();
    let create_key = CommandSpec::new("gcloud").args([
        "iam",
        "service-accounts",
        "keys",
        "create",
        key_arg.as_str(),
        "--iam-account",
        email.as_str(),
        "--project",
        project_id,
    ]);
    record(&mut outcome, &create_key, gcloud(runner, &create_key)?);

    if key_path.is_file() {
        info!(path = %key_path.display(), "service account key created");
        Ok((Some(key_path), outcome))
    } else {
        Ok((None, outcome))
    }
}

fn gcloud(runner: &dyn CommandRunner, spec: &CommandSpec) -> StackupResult<CommandOutput> {
    runner.run(spec).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StackupError::ProvisioningCliMissing,
        _ => StackupError::Io(e),
    })
}

fn record(outcome: &mut StepOutcome, spec: &CommandSpec, output: CommandOutput) {
    if output.success {
        return;
    }
    if output.stderr.contains("already exists") {
        debug!(command = %spec, "already satisfied");
        return;
    }
    let reason = output.stderr.lines().last().unwrap_or("").trim().to_string();
    info!(command = %spec, %reason, "gcloud call failed");
    outcome.warn(format!("`{}` failed: {}", spec, reason));
}
