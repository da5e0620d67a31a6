//! Prometheus scrape configuration

use serde::{Deserialize, Serialize};

use super::collector::METRICS_PORT;
use super::compose::COLLECTOR_SERVICE;
use super::{invalid, to_yaml, validate_yaml, ArtifactKind};
use crate::error::StackupResult;

const KIND: ArtifactKind = ArtifactKind::PrometheusConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PrometheusConfig {
    global: GlobalConfig,
    scrape_configs: Vec<ScrapeConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GlobalConfig {
    scrape_interval: String,
    evaluation_interval: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ScrapeConfig {
    job_name: String,
    static_configs: Vec<StaticConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StaticConfig {
    targets: Vec<String>,
}

pub(super) fn render() -> StackupResult<String> {
    let model = PrometheusConfig {
        global: GlobalConfig {
            scrape_interval: "15s".into(),
            evaluation_interval: "15s".into(),
        },
        scrape_configs: vec![ScrapeConfig {
            job_name: COLLECTOR_SERVICE.into(),
            static_configs: vec![StaticConfig {
                targets: vec![format!("{COLLECTOR_SERVICE}:{METRICS_PORT}")],
            }],
        }],
    };

    let content = to_yaml(KIND, &model)?;
    let parsed: PrometheusConfig = validate_yaml(KIND, &content)?;
    if parsed != model {
        return Err(invalid(KIND, "scrape configuration does not round-trip"));
    }
    Ok(content)
}
