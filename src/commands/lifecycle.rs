//! Status, down, restart, logs and cleanup handlers
//!
//! These operate on a stack that `stackup` already wrote out, so they only
//! need the runtime and the working directory.

use std::time::Duration;

use anyhow::Result;

use stackup::config::{EnvOverrides, RuntimeSelection, Settings};
use stackup::lifecycle;
use stackup::{resolve_runtime, PathProbe, SystemRunner, UreqProbe};

use crate::commands::setup::{resolve_work_dir, runtime_preferences};
use crate::ui::output::Reporter;
use crate::ui::views::health::render_health_report;

/// Working directory, settings and compose command for a day-two command.
struct Target {
    work_dir: std::path::PathBuf,
    settings: Settings,
    runtime: RuntimeSelection,
}

fn resolve_target(
    reporter: &Reporter,
    work_dir: Option<&std::path::Path>,
    use_docker: bool,
) -> Result<Target> {
    let env = EnvOverrides::from_env();
    let work_dir = resolve_work_dir(work_dir, env.work_dir.as_deref())?;
    let (settings, warnings) = Settings::load_or_default(&work_dir)?;
    reporter.config_warnings(&warnings);

    // Keep talking to whatever compose started the stack, unless overridden.
    let saved = match env.compose_cmd {
        Some(_) => None,
        None => lifecycle::saved_runtime(&work_dir)?,
    };
    let runtime = match saved {
        Some(runtime) => runtime,
        None => {
            let prefs = runtime_preferences(use_docker, &env);
            let (runtime, outcome) =
                resolve_runtime(&PathProbe::from_env(), &SystemRunner, &prefs)?;
            reporter.outcome(&outcome);
            runtime
        }
    };

    Ok(Target {
        work_dir,
        settings,
        runtime,
    })
}

pub fn cmd_status(
    reporter: &Reporter,
    work_dir: Option<&std::path::Path>,
    use_docker: bool,
) -> Result<()> {
    let target = resolve_target(reporter, work_dir, use_docker)?;
    let http = UreqProbe::new(
        target
            .settings
            .health
            .timeout_secs
            .map(Duration::from_secs),
    );

    let report = lifecycle::status(&SystemRunner, &http, &target.runtime, &target.work_dir)?;

    let ui = reporter.ui();
    let (rendered, verdict) = render_health_report(
        &report,
        target.settings.health.collector_probe,
        ui.color,
        ui.unicode,
    );
    eprint!("{rendered}");
    for warning in &verdict.warnings {
        reporter.warn(warning);
    }
    if verdict.passed() {
        reporter.success("All services healthy");
    }
    Ok(())
}

pub fn cmd_down(
    reporter: &Reporter,
    work_dir: Option<&std::path::Path>,
    use_docker: bool,
) -> Result<()> {
    let target = resolve_target(reporter, work_dir, use_docker)?;
    lifecycle::down(&SystemRunner, &target.runtime, &target.work_dir)?;
    reporter.success("Stack stopped");
    Ok(())
}

pub fn cmd_restart(
    reporter: &Reporter,
    work_dir: Option<&std::path::Path>,
    use_docker: bool,
    service: Option<&str>,
) -> Result<()> {
    let target = resolve_target(reporter, work_dir, use_docker)?;
    lifecycle::restart(&SystemRunner, &target.runtime, &target.work_dir, service)?;
    reporter.success(format!("Restarted {}", service.unwrap_or("all services")));
    Ok(())
}

pub fn cmd_logs(
    reporter: &Reporter,
    work_dir: Option<&std::path::Path>,
    use_docker: bool,
    service: Option<&str>,
    follow: bool,
) -> Result<()> {
    let target = resolve_target(reporter, work_dir, use_docker)?;
    lifecycle::logs(
        &SystemRunner,
        &target.runtime,
        &target.work_dir,
        service,
        follow,
    )?;
    Ok(())
}

pub fn cmd_cleanup(
    reporter: &Reporter,
    work_dir: Option<&std::path::Path>,
    use_docker: bool,
) -> Result<()> {
    let target = resolve_target(reporter, work_dir, use_docker)?;
    reporter.step("Removing the stack and generated files");

    let removed = lifecycle::cleanup(&SystemRunner, &target.runtime, &target.work_dir)?;

    if reporter.ui().verbose > 0 {
        for path in &removed {
            reporter.hint(format!("removed {}", path.display()));
        }
    }
    reporter.success(format!(
        "Cleanup complete ({} paths removed; backups and credentials kept)",
        removed.len()
    ));
    Ok(())
}
