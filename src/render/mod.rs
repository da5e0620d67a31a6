//! Artifact rendering
//!
//! Every artifact is regenerated from scratch on each run. Rendering is pure
//! (`RunConfig` in, text out); [`generate`] adds the side effects: backup of
//! the previous versions, atomic writes and the ignore-list update.

pub mod backup;
mod collector;
mod compose;
pub mod env_file;
mod grafana;
pub mod ignore;
mod prometheus;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::error::{StackupError, StackupResult};

pub use backup::{backup_existing, timestamp, BACKUP_DIR};
pub use compose::{ComposeFile, ComposeService};
pub use grafana::cloud_monitoring_source;
pub use ignore::{ensure_ignore_entries, IGNORE_FILE, INITIAL_IGNORE_PATTERNS};

/// Dashboard JSON files are picked up from here by the provisioning descriptor.
pub const DASHBOARDS_DIR: &str = "grafana/dashboards";

/// Mount point of the collector config inside its container.
pub(crate) const COLLECTOR_CONFIG_MOUNT: &str = "/etc/otelcol-contrib/config.yaml";
/// Mount point of the key file inside the collector container.
pub(crate) const COLLECTOR_KEY_MOUNT: &str = "/etc/otel/service-account.json";
/// Mount point of the host gcloud directory for ambient credentials.
pub(crate) const GCLOUD_CONFIG_MOUNT: &str = "/etc/gcloud";
/// Mount point of the key file inside the Grafana container.
pub(crate) const GRAFANA_KEY_MOUNT: &str = "/etc/secrets/service-account.json";

/// The fixed set of generated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    CollectorConfig,
    Compose,
    PrometheusConfig,
    PrometheusDatasource,
    CloudMonitoringDatasource,
    Dashboards,
    EnvFile,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::CollectorConfig,
        ArtifactKind::Compose,
        ArtifactKind::PrometheusConfig,
        ArtifactKind::PrometheusDatasource,
        ArtifactKind::CloudMonitoringDatasource,
        ArtifactKind::Dashboards,
        ArtifactKind::EnvFile,
    ];

    /// Destination relative to the working directory.
    pub fn path(self) -> &'static str {
        match self {
            ArtifactKind::CollectorConfig => "otel-collector-config.yaml",
            ArtifactKind::Compose => "docker-compose.yaml",
            ArtifactKind::PrometheusConfig => "prometheus/prometheus.yml",
            ArtifactKind::PrometheusDatasource => "grafana/provisioning/datasources/prometheus.yaml",
            ArtifactKind::CloudMonitoringDatasource => {
                "grafana/provisioning/datasources/cloud-monitoring.yaml"
            }
            ArtifactKind::Dashboards => "grafana/provisioning/dashboards/dashboards.yaml",
            ArtifactKind::EnvFile => ".env",
        }
    }
}

/// One rendered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub content: String,
}

/// The rendered files for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    pub artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    pub fn contains(&self, kind: ArtifactKind) -> bool {
        self.get(kind).is_some()
    }
}

/// Render every artifact for `cfg`.
///
/// The Cloud Monitoring datasource is only included when a key file and a
/// service account email are both available.
pub fn render_artifacts(cfg: &RunConfig) -> StackupResult<ArtifactSet> {
    let mut artifacts = vec![
        Artifact {
            kind: ArtifactKind::CollectorConfig,
            content: collector::render(cfg)?,
        },
        Artifact {
            kind: ArtifactKind::Compose,
            content: compose::render(cfg)?,
        },
        Artifact {
            kind: ArtifactKind::PrometheusConfig,
            content: prometheus::render()?,
        },
        Artifact {
            kind: ArtifactKind::PrometheusDatasource,
            content: grafana::render_prometheus_datasource()?,
        },
        Artifact {
            kind: ArtifactKind::Dashboards,
            content: grafana::render_dashboards()?,
        },
        Artifact {
            kind: ArtifactKind::EnvFile,
            content: env_file::render(cfg)?,
        },
    ];

    match grafana::render_cloud_monitoring_datasource(cfg)? {
        Some(content) => artifacts.push(Artifact {
            kind: ArtifactKind::CloudMonitoringDatasource,
            content,
        }),
        None => debug!("cloud monitoring datasource skipped: needs key file and email"),
    }

    Ok(ArtifactSet { artifacts })
}

/// Write every artifact in `set` under `work_dir`, returning the paths written.
pub fn write_artifacts(work_dir: &Path, set: &ArtifactSet) -> StackupResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(set.artifacts.len());
    for artifact in &set.artifacts {
        let path = work_dir.join(artifact.kind.path());
        crate::fs::write_atomic(&path, &artifact.content)?;
        debug!(path = %path.display(), "wrote artifact");
        written.push(path);
    }
    std::fs::create_dir_all(work_dir.join(DASHBOARDS_DIR))?;
    Ok(written)
}

/// What [`generate`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub backup_dir: Option<PathBuf>,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<ArtifactKind>,
    pub ignore_appended: Vec<String>,
}

/// Back up, render and write all artifacts, then update the ignore list.
pub fn generate(cfg: &RunConfig, stamp: &str) -> StackupResult<GenerateReport> {
    // Render first so a validation failure leaves the directory untouched.
    let set = render_artifacts(cfg)?;

    let paths: Vec<&str> = ArtifactKind::ALL.iter().map(|k| k.path()).collect();
    let backup_dir = backup_existing(&cfg.work_dir, &paths, stamp)?;
    if let Some(dir) = &backup_dir {
        info!(dir = %dir.display(), "backed up previous artifacts");
    }

    let written = write_artifacts(&cfg.work_dir, &set)?;
    let ignore_appended = ensure_ignore_entries(
        &cfg.work_dir.join(IGNORE_FILE),
        &[".env", "credentials/", "backups/"],
    )?;

    let skipped = ArtifactKind::ALL
        .into_iter()
        .filter(|k| !set.contains(*k))
        .collect();

    Ok(GenerateReport {
        backup_dir,
        written,
        skipped,
        ignore_appended,
    })
}

/// Double-quoted YAML scalar. JSON string syntax is a subset of YAML's.
pub(crate) fn yaml_quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

/// Serialize a typed model to YAML.
pub(crate) fn to_yaml<T: serde::Serialize>(kind: ArtifactKind, model: &T) -> StackupResult<String> {
    serde_yaml_ng::to_string(model).map_err(|e| invalid(kind, e))
}

/// Parse rendered YAML back into its schema type.
pub(crate) fn validate_yaml<T: DeserializeOwned>(
    kind: ArtifactKind,
    content: &str,
) -> StackupResult<T> {
    serde_yaml_ng::from_str(content).map_err(|e| invalid(kind, e))
}

pub(crate) fn invalid(kind: ArtifactKind, message: impl std::fmt::Display) -> StackupError {
    StackupError::InvalidArtifact {
        path: PathBuf::from(kind.path()),
        message: message.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::{
        CredentialRef, Engine, RunConfig, RuntimeSelection, Settings, TargetIdentity,
    };
    use std::path::{Path, PathBuf};

    pub fn run_config(work_dir: &Path) -> RunConfig {
        RunConfig {
            work_dir: work_dir.to_path_buf(),
            identity: TargetIdentity {
                project_id: "p1".into(),
                instance_id: "i1".into(),
                database_id: "d1".into(),
            },
            credentials: CredentialRef::Ambient,
            service_account_email: None,
            runtime: RuntimeSelection::new(Engine::Podman, "podman-compose", &[]),
            dev_mode: false,
            gcloud_config_dir: Some(PathBuf::from("/home/op/.config/gcloud")),
            settings: Settings::default(),
        }
    }

    pub fn with_key(mut cfg: RunConfig, key: &Path, email: Option<&str>) -> RunConfig {
        cfg.credentials = CredentialRef::KeyFile(key.to_path_buf());
        cfg.service_account_email = email.map(str::to_string);
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{run_config, with_key};
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn ambient_run_renders_all_but_cloud_monitoring() {
        let cfg = run_config(Path::new("/tmp/stack"));
        let set = render_artifacts(&cfg).unwrap();

        assert_eq!(set.artifacts.len(), 6);
        assert!(!set.contains(ArtifactKind::CloudMonitoringDatasource));
    }

    #[test]
    fn key_and_email_add_cloud_monitoring() {
        let cfg = with_key(
            run_config(Path::new("/tmp/stack")),
            Path::new("/keys/sa.json"),
            Some("sa@p1.iam.gserviceaccount.com"),
        );
        let set = render_artifacts(&cfg).unwrap();
        assert!(set.contains(ArtifactKind::CloudMonitoringDatasource));
    }

    #[test]
    fn yaml_quote_escapes() {
        assert_eq!(yaml_quote("p1"), "\"p1\"");
        assert_eq!(yaml_quote("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn end_to_end_ambient_collector_config() {
        let dir = tempdir().unwrap();
        let cfg = run_config(dir.path());

        generate(&cfg, "20260101-000000").unwrap();

        let content = fs::read_to_string(dir.path().join("otel-collector-config.yaml")).unwrap();
        assert!(content.contains("project_id: \"p1\""), "{content}");
        assert!(content.contains("instance_id: \"i1\""), "{content}");
        assert!(content.lines().any(|l| l.trim() == "- \"d1\""), "{content}");
        assert!(!content.contains("service_account_key:"), "{content}");
    }

    #[test]
    fn generate_writes_everything_and_updates_ignore_list() {
        let dir = tempdir().unwrap();
        let cfg = run_config(dir.path());

        let report = generate(&cfg, "20260101-000000").unwrap();

        assert_eq!(report.written.len(), 6);
        assert_eq!(report.backup_dir, None);
        assert_eq!(report.skipped, vec![ArtifactKind::CloudMonitoringDatasource]);
        assert!(dir.path().join(DASHBOARDS_DIR).is_dir());
        assert!(dir.path().join(".gitignore").exists());
        assert!(!dir
            .path()
            .join(ArtifactKind::CloudMonitoringDatasource.path())
            .exists());
    }

    #[test]
    fn second_generate_backs_up_first() {
        let dir = tempdir().unwrap();
        let cfg = run_config(dir.path());

        generate(&cfg, "20260101-000000").unwrap();
        let report = generate(&cfg, "20260101-000100").unwrap();

        let backup = report.backup_dir.unwrap();
        assert_eq!(backup, dir.path().join("backups/20260101-000100"));
        assert!(backup.join("otel-collector-config.yaml").exists());
        assert!(backup.join("prometheus/prometheus.yml").exists());
    }

    #[test]
    fn key_without_email_leaves_existing_datasource_untouched() {
        let dir = tempdir().unwrap();
        let key = dir.path().join("key.json");
        fs::write(&key, r#"{"type":"service_account"}"#).unwrap();

        let existing = dir
            .path()
            .join(ArtifactKind::CloudMonitoringDatasource.path());
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "# hand edited\n").unwrap();

        let email = crate::collect::resolve_email(Some(&key), None);
        let cfg = with_key(run_config(dir.path()), &key, email.as_deref());
        generate(&cfg, "20260101-000000").unwrap();

        assert_eq!(fs::read_to_string(&existing).unwrap(), "# hand edited\n");
    }

    #[test]
    fn key_without_email_creates_no_datasource() {
        let dir = tempdir().unwrap();
        let key = dir.path().join("key.json");
        fs::write(&key, "{}").unwrap();

        let email = crate::collect::resolve_email(Some(&key), None);
        let cfg = with_key(run_config(dir.path()), &key, email.as_deref());
        generate(&cfg, "20260101-000000").unwrap();

        assert!(!dir
            .path()
            .join(ArtifactKind::CloudMonitoringDatasource.path())
            .exists());
    }
}
