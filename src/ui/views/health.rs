use stackup::config::CollectorProbePolicy;
use stackup::launch::{HealthReport, HealthStatus, Verdict};

use crate::ui::primitives::icon::Icon;

/// One line per probed service, then the verdict hint when it failed.
pub fn render_health_report(
    report: &HealthReport,
    policy: CollectorProbePolicy,
    supports_color: bool,
    supports_unicode: bool,
) -> (String, Verdict) {
    let verdict = report.verdict(policy);
    let mut out = String::new();

    for result in report.results() {
        let advisory = result.endpoint.service == "otel-collector"
            && policy == CollectorProbePolicy::Advisory;
        let (icon, detail) = match &result.status {
            HealthStatus::Healthy => (Icon::Success, "healthy".to_string()),
            HealthStatus::Available => (Icon::Success, "responding".to_string()),
            HealthStatus::Unhealthy(reason) if advisory => (Icon::Warning, reason.clone()),
            HealthStatus::Unhealthy(reason) => (Icon::Error, reason.clone()),
        };
        out.push_str(&format!(
            "  {} {:<15} {} ({})\n",
            icon.colored(supports_color, supports_unicode),
            result.endpoint.service,
            detail,
            result.endpoint.url
        ));
    }

    if let Some(hint) = verdict.hint() {
        out.push_str(&format!(
            "    {} {}\n",
            Icon::Arrow.colored(supports_color, supports_unicode),
            hint
        ));
    }

    (out, verdict)
}
