//! Configuration collection
//!
//! Resolves the target identity and credentials from flags, environment and,
//! when a terminal is attached, interactive prompts.

mod credentials;

pub use credentials::{
    read_service_account_key, resolve_credentials, resolve_email, CredentialChoice,
    CredentialFlags, ServiceAccountKey, GENERATED_KEY_PATH, SERVICE_ACCOUNT_NAME,
};

use tracing::debug;

use crate::config::{EnvOverrides, TargetIdentity};
use crate::error::{StackupError, StackupResult};

/// Interactive input source.
pub trait Prompter {
    /// Free-form text input.
    fn input(&self, prompt: &str) -> std::io::Result<String>;

    /// Choose one of `items`, returning its index.
    fn select(&self, prompt: &str, items: &[&str], default: usize) -> std::io::Result<usize>;
}

/// Identifier values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct IdentityFlags {
    pub project: Option<String>,
    pub instance: Option<String>,
    pub database: Option<String>,
}

/// Resolve project, instance and database ids.
///
/// A flag always wins. Environment values are used only when all three
/// variables are set. Anything still unset is prompted for when a prompter is
/// available; empty values after that are fatal.
pub fn resolve_identity(
    flags: &IdentityFlags,
    env: &EnvOverrides,
    prompter: Option<&dyn Prompter>,
) -> StackupResult<TargetIdentity> {
    let mut project = flags.project.clone();
    let mut instance = flags.instance.clone();
    let mut database = flags.database.clone();

    if let Some((p, i, d)) = env.complete_identity() {
        debug!("using identifiers from environment");
        project.get_or_insert(p);
        instance.get_or_insert(i);
        database.get_or_insert(d);
    }

    if let Some(prompter) = prompter {
        for (slot, prompt) in [
            (&mut project, "Google Cloud project ID"),
            (&mut instance, "Spanner instance ID"),
            (&mut database, "Spanner database ID"),
        ] {
            if slot.as_deref().map_or(true, |v| v.trim().is_empty()) {
                *slot = Some(prompter.input(prompt)?);
            }
        }
    }

    let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
    let identity = TargetIdentity {
        project_id: clean(project),
        instance_id: clean(instance),
        database_id: clean(database),
    };

    let missing: Vec<&'static str> = [
        ("project", &identity.project_id),
        ("instance", &identity.instance_id),
        ("database", &identity.database_id),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(StackupError::MissingIdentifiers { missing });
    }

    // These values end up in `.env`, which the helper scripts source.
    check_identifier("project", &identity.project_id, "-.:")?;
    check_identifier("instance", &identity.instance_id, "-")?;
    check_identifier("database", &identity.database_id, "-_")?;
    Ok(identity)
}

/// Accept lowercase ASCII letters, digits and the characters in `extra`.
fn check_identifier(name: &'static str, value: &str, extra: &str) -> StackupResult<()> {
    let valid = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || extra.contains(c));
    if valid {
        return Ok(());
    }

    let extras: Vec<String> = extra.chars().map(|c| format!("'{c}'")).collect();
    Err(StackupError::InvalidIdentifier {
        name,
        value: value.to_string(),
        allowed: format!("lowercase letters, digits and {}", extras.join(", ")),
    })
}
