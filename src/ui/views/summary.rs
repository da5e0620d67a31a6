use std::path::Path;

use stackup::GenerateReport;

use crate::ui::primitives::icon::Icon;
use crate::ui::primitives::text::ColoredText;
use crate::ui::widgets::r#box::{Box, BoxStyle};

/// Closing box of a setup run.
pub struct SetupSummary<'a> {
    pub work_dir: &'a Path,
    pub generated: &'a GenerateReport,
    pub healthy: bool,
    pub warnings: &'a [String],
}

const ENDPOINTS: [(&str, &str); 3] = [
    ("Grafana", "http://localhost:3000"),
    ("Prometheus", "http://localhost:9090"),
    ("Collector metrics", "http://localhost:8889/metrics"),
];

impl SetupSummary<'_> {
    pub fn render(&self, supports_color: bool, supports_unicode: bool) -> String {
        let clean = self.healthy && self.warnings.is_empty();
        let (style, icon, title) = if clean {
            (
                BoxStyle::Success,
                Icon::Success,
                ColoredText::success("Monitoring stack is up").bold(),
            )
        } else {
            (
                BoxStyle::Warning,
                Icon::Warning,
                ColoredText::warning("Monitoring stack started with warnings").bold(),
            )
        };

        let header = format!(
            "{} {}",
            icon.colored(supports_color, supports_unicode),
            title.render(supports_color)
        );
        let mut b = Box::with_title(header).style(style);
        b.add_empty();

        for (name, url) in ENDPOINTS {
            b.add_line(format!(
                "{:<18} {}",
                name,
                ColoredText::info(url).render(supports_color)
            ));
        }

        b.add_empty();
        b.add_line(format!(
            "{} files written to {}",
            self.generated.written.len(),
            self.work_dir.display()
        ));
        if let Some(backup) = &self.generated.backup_dir {
            b.add_line(format!("previous files saved in {}", backup.display()));
        }

        if !self.warnings.is_empty() {
            b.add_empty();
            for warning in self.warnings {
                b.add_line(format!(
                    "{} {}",
                    Icon::Warning.colored(supports_color, supports_unicode),
                    warning
                ));
            }
        }

        b.add_empty();
        b.add_line(format!(
            "{} {} ./status.sh, ./logs.sh, stackup down",
            Icon::Arrow.colored(supports_color, supports_unicode),
            ColoredText::dim("Next:").render(supports_color)
        ));

        b.render(supports_color, supports_unicode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn clean_run_has_success_title_and_endpoints() {
        let report = GenerateReport {
            written: vec![PathBuf::from("a"), PathBuf::from("b")],
            ..Default::default()
        };
        let summary = SetupSummary {
            work_dir: Path::new("/srv/stack"),
            generated: &report,
            healthy: true,
            warnings: &[],
        };

        let out = summary.render(false, false);

        assert!(out.contains("[OK] Monitoring stack is up"), "{out}");
        assert!(out.contains("http://localhost:3000"));
        assert!(out.contains("2 files written to /srv/stack"));
        assert!(!out.contains("previous files"));
    }

    #[test]
    fn warnings_and_backup_are_listed() {
        let report = GenerateReport {
            backup_dir: Some(PathBuf::from("/srv/stack/backups/20260101-000000")),
            ..Default::default()
        };
        let warnings = vec!["podman-compose missing".to_string()];
        let summary = SetupSummary {
            work_dir: Path::new("/srv/stack"),
            generated: &report,
            healthy: true,
            warnings: &warnings,
        };

        let out = summary.render(false, false);

        assert!(out.contains("[WARN] Monitoring stack started with warnings"));
        assert!(out.contains("[WARN] podman-compose missing"));
        assert!(out.contains("backups/20260101-000000"));
    }
}
