//! `.env` file shared by compose and the helper scripts

use std::collections::BTreeMap;

use super::{invalid, ArtifactKind};
use crate::config::RunConfig;
use crate::error::StackupResult;

const KIND: ArtifactKind = ArtifactKind::EnvFile;

/// Ordered `(key, value)` entries for `cfg`.
fn entries(cfg: &RunConfig) -> Vec<(&'static str, String)> {
    let id = &cfg.identity;
    let mut entries = vec![
        ("SPANNER_PROJECT_ID", id.project_id.clone()),
        ("SPANNER_INSTANCE_ID", id.instance_id.clone()),
        ("SPANNER_DATABASE_ID", id.database_id.clone()),
        ("COLLECTOR_IMAGE", cfg.collector_image().to_string()),
        ("COMPOSE_CMD", cfg.runtime.command_line()),
        ("DEV_MODE", cfg.dev_mode.to_string()),
    ];
    if let Some(key) = cfg.credentials.key_file() {
        entries.push(("GOOGLE_APPLICATION_CREDENTIALS", key.display().to_string()));
    }
    entries
}

pub(super) fn render(cfg: &RunConfig) -> StackupResult<String> {
    let expected = entries(cfg);
    let mut out = String::from("# Generated by stackup; regenerated on every run.\n");
    for (key, value) in &expected {
        out.push_str(key);
        out.push('=');
        out.push_str(&shell_quote(key, value)?);
        out.push('\n');
    }

    let parsed = parse(&out)?;
    let expected: BTreeMap<String, String> = expected
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    if parsed != expected {
        return Err(invalid(KIND, "entries do not round-trip"));
    }
    Ok(out)
}

/// Single-quoted value. Both compose and `source` read it literally, so `$`
/// and backticks stay inert; a `'` or newline cannot be expressed and is
/// rejected.
fn shell_quote(key: &str, value: &str) -> StackupResult<String> {
    if value.contains(['\'', '\n', '\r']) {
        return Err(invalid(
            KIND,
            format!("{key} contains a quote or line break: {value:?}"),
        ));
    }
    Ok(format!("'{value}'"))
}

/// Parse `KEY='value'` lines; comments and blank lines are skipped.
pub fn parse(content: &str) -> StackupResult<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .and_then(|(key, raw)| {
                let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
                (!inner.contains('\'')).then(|| (key, inner))
            })
            .ok_or_else(|| invalid(KIND, format!("line {}: expected KEY='value'", idx + 1)))?;
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}
