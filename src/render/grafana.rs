//! Grafana provisioning files

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{invalid, to_yaml, validate_yaml, ArtifactKind, GRAFANA_KEY_MOUNT};
use crate::config::RunConfig;
use crate::error::StackupResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasourceFile {
    api_version: u32,
    datasources: Vec<Datasource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Datasource {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default)]
    is_default: bool,
    #[serde(default)]
    editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json_data: Option<CloudMonitoringJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudMonitoringJson {
    authentication_type: String,
    default_project: String,
    client_email: String,
    token_uri: String,
    private_key_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardsFile {
    api_version: u32,
    providers: Vec<DashboardProvider>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardProvider {
    name: String,
    org_id: u32,
    folder: String,
    #[serde(rename = "type")]
    kind: String,
    disable_deletion: bool,
    update_interval_seconds: u32,
    allow_ui_updates: bool,
    options: ProviderOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ProviderOptions {
    path: String,
}

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Key file and email, when the Cloud Monitoring datasource can be provisioned.
pub fn cloud_monitoring_source(cfg: &RunConfig) -> Option<(&Path, &str)> {
    let key = cfg.credentials.key_file()?;
    let email = cfg.service_account_email.as_deref()?;
    Some((key, email))
}

pub(super) fn render_prometheus_datasource() -> StackupResult<String> {
    let model = DatasourceFile {
        api_version: 1,
        datasources: vec![Datasource {
            name: "Prometheus".into(),
            kind: "prometheus".into(),
            access: "proxy".into(),
            url: Some("http://prometheus:9090".into()),
            is_default: true,
            editable: true,
            json_data: None,
        }],
    };
    round_trip(ArtifactKind::PrometheusDatasource, &model)
}

pub(super) fn render_cloud_monitoring_datasource(cfg: &RunConfig) -> StackupResult<Option<String>> {
    let Some((_, email)) = cloud_monitoring_source(cfg) else {
        return Ok(None);
    };

    let model = DatasourceFile {
        api_version: 1,
        datasources: vec![Datasource {
            name: "Google Cloud Monitoring".into(),
            kind: "stackdriver".into(),
            access: "proxy".into(),
            url: None,
            is_default: false,
            editable: true,
            json_data: Some(CloudMonitoringJson {
                authentication_type: "jwt".into(),
                default_project: cfg.identity.project_id.clone(),
                client_email: email.to_string(),
                token_uri: GOOGLE_TOKEN_URI.into(),
                private_key_path: GRAFANA_KEY_MOUNT.into(),
            }),
        }],
    };
    round_trip(ArtifactKind::CloudMonitoringDatasource, &model).map(Some)
}

pub(super) fn render_dashboards() -> StackupResult<String> {
    let model = DashboardsFile {
        api_version: 1,
        providers: vec![DashboardProvider {
            name: "spanner".into(),
            org_id: 1,
            folder: "Spanner".into(),
            kind: "file".into(),
            disable_deletion: false,
            update_interval_seconds: 30,
            allow_ui_updates: true,
            options: ProviderOptions {
                path: "/var/lib/grafana/dashboards".into(),
            },
        }],
    };
    round_trip(ArtifactKind::Dashboards, &model)
}

fn round_trip<T>(kind: ArtifactKind, model: &T) -> StackupResult<String>
where
    T: Serialize + serde::de::DeserializeOwned + PartialEq,
{
    let content = to_yaml(kind, model)?;
    let parsed: T = validate_yaml(kind, &content)?;
    if &parsed != model {
        return Err(invalid(kind, "provisioning file does not round-trip"));
    }
    Ok(content)
}
