//! Service launch and health probing
//!
//! `compose up -d`, a flat startup wait, then one GET per endpoint. There is
//! no retry: a failed probe is reported with a hint and the run carries on.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{CollectorProbePolicy, RuntimeSelection};
use crate::error::{StackupError, StackupResult};
use crate::process::{CommandRunner, CommandSpec};

/// Compose invocation rooted at `work_dir`, ready for subcommand arguments.
pub fn compose_command(runtime: &RuntimeSelection, work_dir: &Path) -> CommandSpec {
    CommandSpec::new(runtime.program.as_str())
        .args(runtime.args.iter().cloned())
        .current_dir(work_dir)
}

/// Run `<compose> <args>` with output streamed to the terminal.
pub(crate) fn run_compose(
    runner: &dyn CommandRunner,
    runtime: &RuntimeSelection,
    work_dir: &Path,
    args: &[&str],
) -> StackupResult<()> {
    let spec = compose_command(runtime, work_dir)
        .args(args.iter().copied())
        .interactive(true);
    info!(command = %spec, "compose");

    let output = runner.run(&spec)?;
    if output.success {
        Ok(())
    } else {
        Err(StackupError::ComposeFailed {
            command: spec.to_string(),
            code: output.code,
        })
    }
}

/// Bring the stack up in the background.
pub fn start_services(
    runner: &dyn CommandRunner,
    runtime: &RuntimeSelection,
    work_dir: &Path,
) -> StackupResult<()> {
    run_compose(runner, runtime, work_dir, &["up", "-d"])
}

/// Block for the configured startup delay.
pub fn wait_for_startup(wait: Duration) {
    if wait.is_zero() {
        return;
    }
    debug!(secs = wait.as_secs(), "waiting for services to start");
    std::thread::sleep(wait);
}

/// Single-shot HTTP GET returning the status code.
pub trait HttpProbe {
    /// `Err` carries a transport failure (refused, timeout, DNS).
    fn get_status(&self, url: &str) -> Result<u16, String>;
}

/// [`HttpProbe`] backed by a `ureq` agent.
pub struct UreqProbe {
    agent: ureq::Agent,
}

impl UreqProbe {
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl HttpProbe for UreqProbe {
    fn get_status(&self, url: &str) -> Result<u16, String> {
        match self.agent.get(url).call() {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(transport)) => Err(transport.to_string()),
        }
    }
}

/// What counts as a passing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Exactly HTTP 200
    Ok200,
    /// Any 2xx
    AnySuccess,
}

/// A fixed health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub service: &'static str,
    pub url: &'static str,
    pub criterion: Criterion,
}

pub const PROMETHEUS_ENDPOINT: Endpoint = Endpoint {
    service: "prometheus",
    url: "http://localhost:9090/-/healthy",
    criterion: Criterion::Ok200,
};

pub const GRAFANA_ENDPOINT: Endpoint = Endpoint {
    service: "grafana",
    url: "http://localhost:3000/api/health",
    criterion: Criterion::Ok200,
};

pub const COLLECTOR_ENDPOINT: Endpoint = Endpoint {
    service: "otel-collector",
    url: "http://localhost:8889/metrics",
    criterion: Criterion::AnySuccess,
};

/// Probe result for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// Responding, checked with the looser criterion
    Available,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy(_))
    }
}

/// One probed endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub endpoint: Endpoint,
    pub status: HealthStatus,
}

/// Results of probing the whole stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub prometheus: ProbeResult,
    pub grafana: ProbeResult,
    pub collector: ProbeResult,
}

/// Overall verdict of a [`HealthReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Services whose failure fails the verdict
    pub failed: Vec<&'static str>,
    /// Advisory failures
    pub warnings: Vec<String>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.failed.is_empty()
    }

    /// Where to look next when the verdict failed.
    pub fn hint(&self) -> Option<String> {
        (!self.passed()).then(|| {
            format!(
                "{} did not report healthy; inspect with `stackup logs {}`",
                self.failed.join(", "),
                self.failed[0]
            )
        })
    }
}

impl HealthReport {
    pub fn results(&self) -> [&ProbeResult; 3] {
        [&self.prometheus, &self.grafana, &self.collector]
    }

    pub fn verdict(&self, policy: CollectorProbePolicy) -> Verdict {
        let mut failed = Vec::new();
        let mut warnings = Vec::new();

        for result in [&self.prometheus, &self.grafana] {
            if !result.status.is_ok() {
                failed.push(result.endpoint.service);
            }
        }

        if let HealthStatus::Unhealthy(reason) = &self.collector.status {
            match policy {
                CollectorProbePolicy::Required => failed.push(self.collector.endpoint.service),
                CollectorProbePolicy::Advisory => warnings.push(format!(
                    "collector metrics endpoint {} not reachable yet ({reason}); it may still be starting",
                    self.collector.endpoint.url
                )),
            }
        }

        Verdict { failed, warnings }
    }
}

/// Probe one endpoint.
pub fn probe(http: &dyn HttpProbe, endpoint: Endpoint) -> ProbeResult {
    let status = match http.get_status(endpoint.url) {
        Ok(code) => match endpoint.criterion {
            Criterion::Ok200 if code == 200 => HealthStatus::Healthy,
            Criterion::AnySuccess if (200..300).contains(&code) => HealthStatus::Available,
            _ => HealthStatus::Unhealthy(format!("HTTP {code}")),
        },
        Err(reason) => HealthStatus::Unhealthy(reason),
    };

    if status.is_ok() {
        debug!(service = endpoint.service, ?status, "probe passed");
    } else {
        info!(service = endpoint.service, ?status, "probe failed");
    }
    ProbeResult { endpoint, status }
}

/// Probe all three services once.
pub fn probe_all(http: &dyn HttpProbe) -> HealthReport {
    HealthReport {
        prometheus: probe(http, PROMETHEUS_ENDPOINT),
        grafana: probe(http, GRAFANA_ENDPOINT),
        collector: probe(http, COLLECTOR_ENDPOINT),
    }
}
