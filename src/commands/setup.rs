//! Default command: check, collect, render, launch, probe
//!
//! The container runtime is resolved before anything is rendered, so a host
//! without podman or docker leaves the working directory untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;

use stackup::collect::{resolve_email, CredentialFlags};
use stackup::config::{EnvOverrides, RunConfig, Settings};
use stackup::launch::{probe_all, start_services, wait_for_startup, UreqProbe};
use stackup::render::{generate, timestamp};
use stackup::source::{prepare_dev_collector, SourceOptions};
use stackup::{
    check_required_tools, emit_helper_scripts, resolve_credentials, resolve_identity,
    resolve_runtime, IdentityFlags, PathProbe, Prompter, RuntimePreferences, SystemRunner,
    REQUIRED_TOOLS,
};

use crate::cli::Cli;
use crate::ui::output::Reporter;
use crate::ui::prompt::DialoguerPrompter;
use crate::ui::views::health::render_health_report;
use crate::ui::views::summary::SetupSummary;

pub fn cmd_setup(cli: &Cli, reporter: &Reporter) -> Result<()> {
    let ui = *reporter.ui();
    let env = EnvOverrides::from_env();
    let work_dir = resolve_work_dir(cli.work_dir.as_deref(), env.work_dir.as_deref())?;
    let mut warnings: Vec<String> = Vec::new();

    let (settings, config_warnings) = Settings::load_or_default(&work_dir)?;
    reporter.config_warnings(&config_warnings);

    let probe = PathProbe::from_env();
    let runner = SystemRunner;

    reporter.step("Checking prerequisites");
    check_required_tools(&probe, REQUIRED_TOOLS)?;
    let prefs = runtime_preferences(cli.use_docker, &env);
    let (runtime, outcome) = resolve_runtime(&probe, &runner, &prefs)?;
    warnings.extend(reporter.outcome(&outcome));
    reporter.success(format!("Using {}", runtime.command_line()));

    // Nothing is written until the host is known to be able to run the stack.
    std::fs::create_dir_all(&work_dir)
        .with_context(|| format!("could not create {}", work_dir.display()))?;

    let prompter = ui.interactive.then(|| DialoguerPrompter::new(ui.unicode));
    let prompter: Option<&dyn Prompter> = prompter.as_ref().map(|p| p as &dyn Prompter);

    let identity_flags = IdentityFlags {
        project: cli.project.clone(),
        instance: cli.instance.clone(),
        database: cli.database.clone(),
    };
    let identity = resolve_identity(&identity_flags, &env, prompter)?;

    let credential_flags = CredentialFlags {
        key: cli.service_account_key.clone(),
        email: cli.service_account_email.clone(),
    };
    let (credentials, outcome) = resolve_credentials(
        &credential_flags,
        &identity.project_id,
        &work_dir,
        prompter,
        &runner,
        &probe,
    )?;
    warnings.extend(reporter.outcome(&outcome));
    let service_account_email =
        resolve_email(credentials.key_file(), credential_flags.email.as_deref());

    let cfg = RunConfig {
        work_dir,
        identity,
        credentials,
        service_account_email,
        runtime,
        dev_mode: cli.dev_mode || env.dev_mode.unwrap_or(false),
        gcloud_config_dir: gcloud_config_dir(),
        settings,
    };

    if cfg.dev_mode {
        reporter.step("Preparing development collector image");
        let opts = SourceOptions {
            skip_clone: cli.skip_clone,
            skip_build: cli.skip_build,
        };
        let outcome = prepare_dev_collector(
            &runner,
            &cfg.runtime,
            &cfg.work_dir,
            cfg.collector_image(),
            opts,
        )?;
        warnings.extend(reporter.outcome(&outcome));
    }

    reporter.step("Writing configuration");
    let generated = generate(&cfg, &timestamp(Local::now()))?;
    emit_helper_scripts(&cfg.work_dir)?;
    if !generated.ignore_appended.is_empty() {
        reporter.success(format!(
            "Added {} to .gitignore",
            generated.ignore_appended.join(", ")
        ));
    }

    reporter.step("Starting services");
    start_services(&runner, &cfg.runtime, &cfg.work_dir)?;
    wait_for_startup(Duration::from_secs(cfg.settings.startup.wait_secs));

    let http = UreqProbe::new(cfg.settings.health.timeout_secs.map(Duration::from_secs));
    let report = probe_all(&http);
    let (rendered, verdict) = render_health_report(
        &report,
        cfg.settings.health.collector_probe,
        ui.color,
        ui.unicode,
    );
    eprint!("{rendered}");
    warnings.extend(verdict.warnings.iter().cloned());
    if let Some(hint) = verdict.hint() {
        warnings.push(hint);
    }

    let summary = SetupSummary {
        work_dir: &cfg.work_dir,
        generated: &generated,
        healthy: verdict.passed(),
        warnings: &warnings,
    };
    eprint!("{}", summary.render(ui.color, ui.unicode));
    Ok(())
}

/// Absolute working directory. Flag beats environment. Nothing is created.
pub fn resolve_work_dir(flag: Option<&Path>, env: Option<&Path>) -> Result<PathBuf> {
    let dir = match flag.or(env) {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("could not read current directory")?,
    };
    std::path::absolute(&dir).with_context(|| format!("could not resolve {}", dir.display()))
}

pub fn runtime_preferences(use_docker: bool, env: &EnvOverrides) -> RuntimePreferences {
    RuntimePreferences {
        prefer_docker: use_docker || env.use_docker.unwrap_or(false),
        compose_override: env.compose_cmd.clone(),
        home: dirs::home_dir(),
    }
}

/// Host gcloud configuration, honoring `CLOUDSDK_CONFIG`.
fn gcloud_config_dir() -> Option<PathBuf> {
    std::env::var_os("CLOUDSDK_CONFIG")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config").join("gcloud")))
}
