//! Compose file for the three-service stack

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::grafana::cloud_monitoring_source;
use super::{
    invalid, to_yaml, validate_yaml, ArtifactKind, COLLECTOR_CONFIG_MOUNT, COLLECTOR_KEY_MOUNT,
    DASHBOARDS_DIR, GCLOUD_CONFIG_MOUNT, GRAFANA_KEY_MOUNT,
};
use crate::config::{CredentialRef, RunConfig};
use crate::error::StackupResult;

pub const COLLECTOR_SERVICE: &str = "otel-collector";
pub const PROMETHEUS_SERVICE: &str = "prometheus";
pub const GRAFANA_SERVICE: &str = "grafana";

const KIND: ArtifactKind = ArtifactKind::Compose;

/// Top level of a compose file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeFile {
    pub services: BTreeMap<String, ComposeService>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, NamedVolume>,
}

/// Named volume declaration; no options are needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedVolume {}

/// One compose service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeService {
    pub image: String,
    pub container_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,
}

pub(super) fn render(cfg: &RunConfig) -> StackupResult<String> {
    let model = build(cfg)?;
    let content = to_yaml(KIND, &model)?;

    let parsed: ComposeFile = validate_yaml(KIND, &content)?;
    if parsed != model {
        return Err(invalid(KIND, "compose file does not round-trip"));
    }
    Ok(content)
}

fn build(cfg: &RunConfig) -> StackupResult<ComposeFile> {
    let images = &cfg.settings.images;
    let restart = Some("unless-stopped".to_string());

    let mut collector = ComposeService {
        image: cfg.collector_image().to_string(),
        container_name: COLLECTOR_SERVICE.to_string(),
        command: vec![format!("--config={COLLECTOR_CONFIG_MOUNT}")],
        ports: vec!["8889:8889".into(), "13133:13133".into()],
        volumes: vec![format!(
            "./{}:{COLLECTOR_CONFIG_MOUNT}:ro",
            ArtifactKind::CollectorConfig.path()
        )],
        restart: restart.clone(),
        // The dev image only exists locally.
        pull_policy: cfg.dev_mode.then(|| "never".to_string()),
        ..Default::default()
    };

    match &cfg.credentials {
        CredentialRef::KeyFile(key) => {
            collector
                .volumes
                .push(format!("{}:{COLLECTOR_KEY_MOUNT}:ro", key.display()));
            collector.environment.insert(
                "GOOGLE_APPLICATION_CREDENTIALS".into(),
                COLLECTOR_KEY_MOUNT.into(),
            );
        }
        CredentialRef::Ambient => {
            let gcloud = cfg.gcloud_config_dir.as_ref().ok_or_else(|| {
                invalid(
                    KIND,
                    "ambient credentials need the gcloud configuration directory; set HOME or use --service-account-key",
                )
            })?;
            collector
                .volumes
                .push(format!("{}:{GCLOUD_CONFIG_MOUNT}:ro", gcloud.display()));
            collector.environment.insert(
                "GOOGLE_APPLICATION_CREDENTIALS".into(),
                format!("{GCLOUD_CONFIG_MOUNT}/application_default_credentials.json"),
            );
        }
    }

    let prometheus = ComposeService {
        image: images.prometheus.clone(),
        container_name: PROMETHEUS_SERVICE.to_string(),
        command: vec![
            "--config.file=/etc/prometheus/prometheus.yml".into(),
            "--storage.tsdb.path=/prometheus".into(),
            "--web.enable-lifecycle".into(),
        ],
        ports: vec!["9090:9090".into()],
        volumes: vec![
            format!(
                "./{}:/etc/prometheus/prometheus.yml:ro",
                ArtifactKind::PrometheusConfig.path()
            ),
            "prometheus-data:/prometheus".into(),
        ],
        depends_on: vec![COLLECTOR_SERVICE.to_string()],
        restart: restart.clone(),
        ..Default::default()
    };

    let mut grafana = ComposeService {
        image: images.grafana.clone(),
        container_name: GRAFANA_SERVICE.to_string(),
        ports: vec!["3000:3000".into()],
        volumes: vec![
            "./grafana/provisioning:/etc/grafana/provisioning:ro".into(),
            format!("./{DASHBOARDS_DIR}:/var/lib/grafana/dashboards:ro"),
            "grafana-data:/var/lib/grafana".into(),
        ],
        environment: [
            ("GF_SECURITY_ADMIN_USER", "admin"),
            ("GF_SECURITY_ADMIN_PASSWORD", "admin"),
            ("GF_AUTH_ANONYMOUS_ENABLED", "true"),
            ("GF_AUTH_ANONYMOUS_ORG_ROLE", "Viewer"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
        depends_on: vec![PROMETHEUS_SERVICE.to_string()],
        restart,
        ..Default::default()
    };

    if let Some((key, _)) = cloud_monitoring_source(cfg) {
        grafana
            .volumes
            .push(format!("{}:{GRAFANA_KEY_MOUNT}:ro", key.display()));
    }

    let services = [
        (COLLECTOR_SERVICE, collector),
        (PROMETHEUS_SERVICE, prometheus),
        (GRAFANA_SERVICE, grafana),
    ]
    .into_iter()
    .map(|(name, svc)| (name.to_string(), svc))
    .collect();

    let volumes = ["prometheus-data", "grafana-data"]
        .into_iter()
        .map(|name| (name.to_string(), NamedVolume::default()))
        .collect();

    Ok(ComposeFile { services, volumes })
}

#[cfg(test)]
mod tests {
    use super::super::testing::{run_config, with_key};
    use super::*;
    use std::path::Path;

    fn parsed(cfg: &RunConfig) -> ComposeFile {
        serde_yaml_ng::from_str(&render(cfg).unwrap()).unwrap()
    }

    #[test]
    fn three_services_with_released_image() {
        let compose = parsed(&run_config(Path::new("/tmp/stack")));

        let names: Vec<&str> = compose.services.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["grafana", "otel-collector", "prometheus"]);

        let collector = &compose.services[COLLECTOR_SERVICE];
        assert_eq!(collector.image, "otel/opentelemetry-collector-contrib:0.115.0");
        assert_eq!(collector.pull_policy, None);
        assert!(compose.volumes.contains_key("prometheus-data"));
        assert!(compose.volumes.contains_key("grafana-data"));
    }

    #[test]
    fn dev_mode_uses_local_image_without_pulling() {
        let mut cfg = run_config(Path::new("/tmp/stack"));
        cfg.dev_mode = true;

        let compose = parsed(&cfg);
        let collector = &compose.services[COLLECTOR_SERVICE];

        assert_eq!(collector.image, "otelcol-spanner:dev");
        assert_eq!(collector.pull_policy.as_deref(), Some("never"));
    }

    #[test]
    fn ambient_mounts_gcloud_directory() {
        let compose = parsed(&run_config(Path::new("/tmp/stack")));
        let collector = &compose.services[COLLECTOR_SERVICE];

        assert!(collector
            .volumes
            .contains(&"/home/op/.config/gcloud:/etc/gcloud:ro".to_string()));
        assert_eq!(
            collector.environment["GOOGLE_APPLICATION_CREDENTIALS"],
            "/etc/gcloud/application_default_credentials.json"
        );
    }

    #[test]
    fn ambient_without_gcloud_dir_is_invalid() {
        let mut cfg = run_config(Path::new("/tmp/stack"));
        cfg.gcloud_config_dir = None;

        let err = render(&cfg).unwrap_err();
        assert!(err.to_string().contains("docker-compose.yaml"), "{err}");
    }

    #[test]
    fn key_file_is_mounted_read_only() {
        let cfg = with_key(
            run_config(Path::new("/tmp/stack")),
            Path::new("/keys/sa.json"),
            None,
        );
        let compose = parsed(&cfg);
        let collector = &compose.services[COLLECTOR_SERVICE];

        assert!(collector
            .volumes
            .contains(&"/keys/sa.json:/etc/otel/service-account.json:ro".to_string()));
        assert_eq!(
            collector.environment["GOOGLE_APPLICATION_CREDENTIALS"],
            "/etc/otel/service-account.json"
        );
        // No email, so Grafana gets no key.
        assert!(!compose.services[GRAFANA_SERVICE]
            .volumes
            .iter()
            .any(|v| v.contains("service-account.json")));
    }

    #[test]
    fn cloud_monitoring_mounts_key_into_grafana() {
        let cfg = with_key(
            run_config(Path::new("/tmp/stack")),
            Path::new("/keys/sa.json"),
            Some("sa@p1.iam.gserviceaccount.com"),
        );
        let compose = parsed(&cfg);

        assert!(compose.services[GRAFANA_SERVICE]
            .volumes
            .contains(&"/keys/sa.json:/etc/secrets/service-account.json:ro".to_string()));
    }

    #[test]
    fn ports_are_published() {
        let compose = parsed(&run_config(Path::new("/tmp/stack")));

        assert_eq!(compose.services[PROMETHEUS_SERVICE].ports, vec!["9090:9090"]);
        assert_eq!(compose.services[GRAFANA_SERVICE].ports, vec!["3000:3000"]);
        assert!(compose.services[COLLECTOR_SERVICE]
            .ports
            .contains(&"8889:8889".to_string()));
    }
}
