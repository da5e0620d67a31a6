//! Operator helper scripts
//!
//! Fixed shell scripts written next to the artifacts. They read the compose
//! command and identifiers from `.env` and are never run by stackup itself.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StackupResult;

const PREAMBLE: &str = r#"#!/usr/bin/env bash
set -euo pipefail
cd "$(dirname "$0")"
set -a
# shellcheck disable=SC1091
source ./.env
set +a
"#;

const STATUS: &str = r#"
$COMPOSE_CMD ps
echo
for url in http://localhost:9090/-/healthy http://localhost:3000/api/health http://localhost:8889/metrics; do
  if curl -fsS -o /dev/null "$url"; then
    echo "ok    $url"
  else
    echo "fail  $url"
  fi
done
"#;

const LOGS: &str = r#"
if [ "$#" -eq 0 ]; then
  PS3="Service: "
  select svc in otel-collector prometheus grafana all; do
    [ -n "${svc:-}" ] && break
  done
  [ -n "${svc:-}" ] || exit 1
  if [ "$svc" = all ]; then
    set --
  else
    set -- "$svc"
  fi
fi
$COMPOSE_CMD logs -f "$@"
"#;

const RESTART: &str = r#"
$COMPOSE_CMD restart "$@"
"#;

const GENERATE_TRAFFIC: &str = r#"
# Runs a handful of queries so the receiver has query stats to report.
count="${1:-20}"
for i in $(seq 1 "$count"); do
  gcloud spanner databases execute-sql "$SPANNER_DATABASE_ID" \
    --project="$SPANNER_PROJECT_ID" \
    --instance="$SPANNER_INSTANCE_ID" \
    --sql="SELECT $i AS n" >/dev/null
  echo "query $i/$count"
done
"#;

/// Script file names and bodies, in emission order.
pub const HELPER_SCRIPTS: &[(&str, &str)] = &[
    ("status.sh", STATUS),
    ("logs.sh", LOGS),
    ("restart.sh", RESTART),
    ("generate-traffic.sh", GENERATE_TRAFFIC),
];

/// Write every helper script into `work_dir`, replacing earlier copies.
pub fn emit_helper_scripts(work_dir: &Path) -> StackupResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(HELPER_SCRIPTS.len());
    for (name, body) in HELPER_SCRIPTS {
        let path = work_dir.join(name);
        crate::fs::write_atomic(&path, &format!("{PREAMBLE}{body}"))?;
        crate::fs::set_executable(&path)?;
        debug!(path = %path.display(), "wrote helper script");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn writes_all_four_scripts() {
        let dir = tempdir().unwrap();

        let written = emit_helper_scripts(dir.path()).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["status.sh", "logs.sh", "restart.sh", "generate-traffic.sh"]
        );
    }

    #[test]
    fn scripts_source_env_file() {
        let dir = tempdir().unwrap();
        emit_helper_scripts(dir.path()).unwrap();

        for (name, _) in HELPER_SCRIPTS {
            let content = fs::read_to_string(dir.path().join(name)).unwrap();
            assert!(content.starts_with("#!/usr/bin/env bash\n"), "{name}");
            assert!(content.contains("source ./.env"), "{name}");
        }
    }

    #[test]
    fn existing_scripts_are_overwritten() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("status.sh"), "echo stale").unwrap();

        emit_helper_scripts(dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("status.sh")).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.contains("$COMPOSE_CMD ps"));
    }

    #[test]
    fn logs_script_offers_service_menu_without_arguments() {
        let dir = tempdir().unwrap();
        emit_helper_scripts(dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("logs.sh")).unwrap();
        assert!(content.contains(r#"if [ "$#" -eq 0 ]; then"#));
        assert!(content.contains("select svc in otel-collector prometheus grafana all; do"));
        assert!(content.trim_end().ends_with(r#"$COMPOSE_CMD logs -f "$@""#));
    }

    #[cfg(unix)]
    #[test]
    fn scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        emit_helper_scripts(dir.path()).unwrap();

        for (name, _) in HELPER_SCRIPTS {
            let mode = fs::metadata(dir.path().join(name)).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755, "{name}");
        }
    }
}
