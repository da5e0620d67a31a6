//! OpenTelemetry collector configuration
//!
//! Written line by line rather than through the serializer so identifiers come
//! out as double-quoted scalars (`project_id: "p1"`); the result is then
//! parsed back into [`CollectorSchema`] and checked against the inputs.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Deserialize;

use super::{invalid, validate_yaml, yaml_quote, ArtifactKind, COLLECTOR_KEY_MOUNT};
use crate::config::{CredentialRef, RunConfig};
use crate::error::StackupResult;

/// Port the Prometheus exporter listens on.
pub const METRICS_PORT: u16 = 8889;
/// Port of the collector's health_check extension.
pub const HEALTH_CHECK_PORT: u16 = 13133;

const KIND: ArtifactKind = ArtifactKind::CollectorConfig;

pub(super) fn render(cfg: &RunConfig) -> StackupResult<String> {
    let id = &cfg.identity;
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = (|| -> std::fmt::Result {
        writeln!(out, "receivers:")?;
        writeln!(out, "  googlecloudspanner:")?;
        writeln!(out, "    collection_interval: 60s")?;
        writeln!(out, "    top_metrics_query_max_rows: 100")?;
        writeln!(out, "    backfill_enabled: true")?;
        writeln!(out, "    projects:")?;
        writeln!(out, "      - project_id: {}", yaml_quote(&id.project_id))?;
        if let CredentialRef::KeyFile(_) = cfg.credentials {
            writeln!(out, "        service_account_key: {}", yaml_quote(COLLECTOR_KEY_MOUNT))?;
        }
        writeln!(out, "        instances:")?;
        writeln!(out, "          - instance_id: {}", yaml_quote(&id.instance_id))?;
        writeln!(out, "            databases:")?;
        writeln!(out, "              - {}", yaml_quote(&id.database_id))?;
        writeln!(out)?;
        writeln!(out, "processors:")?;
        writeln!(out, "  batch:")?;
        writeln!(out, "    send_batch_size: 200")?;
        writeln!(out, "    timeout: 10s")?;
        writeln!(out)?;
        writeln!(out, "exporters:")?;
        writeln!(out, "  prometheus:")?;
        writeln!(out, "    endpoint: \"0.0.0.0:{METRICS_PORT}\"")?;
        writeln!(out, "    namespace: spanner")?;
        writeln!(out, "    send_timestamps: true")?;
        writeln!(out)?;
        writeln!(out, "extensions:")?;
        writeln!(out, "  health_check:")?;
        writeln!(out, "    endpoint: \"0.0.0.0:{HEALTH_CHECK_PORT}\"")?;
        writeln!(out)?;
        writeln!(out, "service:")?;
        writeln!(out, "  extensions: [health_check]")?;
        writeln!(out, "  pipelines:")?;
        writeln!(out, "    metrics:")?;
        writeln!(out, "      receivers: [googlecloudspanner]")?;
        writeln!(out, "      processors: [batch]")?;
        writeln!(out, "      exporters: [prometheus]")?;
        Ok(())
    })();

    check(cfg, &out)?;
    Ok(out)
}

/// The parts of the collector schema this tool is responsible for.
#[derive(Debug, Deserialize)]
struct CollectorSchema {
    receivers: Receivers,
    service: ServiceSection,
}

#[derive(Debug, Deserialize)]
struct Receivers {
    googlecloudspanner: SpannerReceiver,
}

#[derive(Debug, Deserialize)]
struct SpannerReceiver {
    projects: Vec<ProjectEntry>,
}

#[derive(Debug, Deserialize)]
struct ProjectEntry {
    project_id: String,
    #[serde(default)]
    service_account_key: Option<String>,
    instances: Vec<InstanceEntry>,
}

#[derive(Debug, Deserialize)]
struct InstanceEntry {
    instance_id: String,
    databases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceSection {
    pipelines: BTreeMap<String, Pipeline>,
}

#[derive(Debug, Deserialize)]
struct Pipeline {
    receivers: Vec<String>,
    exporters: Vec<String>,
}

fn check(cfg: &RunConfig, content: &str) -> StackupResult<()> {
    let parsed: CollectorSchema = validate_yaml(KIND, content)?;
    let id = &cfg.identity;

    let [project] = parsed.receivers.googlecloudspanner.projects.as_slice() else {
        return Err(invalid(KIND, "expected exactly one project"));
    };
    if project.project_id != id.project_id {
        return Err(invalid(KIND, "project_id does not round-trip"));
    }
    if project.service_account_key.is_some() != cfg.credentials.key_file().is_some() {
        return Err(invalid(KIND, "service_account_key does not match credentials"));
    }
    let [instance] = project.instances.as_slice() else {
        return Err(invalid(KIND, "expected exactly one instance"));
    };
    if instance.instance_id != id.instance_id || instance.databases != [id.database_id.clone()] {
        return Err(invalid(KIND, "instance or database does not round-trip"));
    }

    let metrics = parsed
        .service
        .pipelines
        .get("metrics")
        .ok_or_else(|| invalid(KIND, "missing metrics pipeline"))?;
    if !metrics.receivers.iter().any(|r| r == "googlecloudspanner")
        || !metrics.exporters.iter().any(|e| e == "prometheus")
    {
        return Err(invalid(KIND, "metrics pipeline is not wired to the spanner receiver"));
    }
    Ok(())
}
