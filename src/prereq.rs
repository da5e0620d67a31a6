//! Prerequisite checks and container runtime selection
//!
//! Missing core tools are fatal. A missing `podman-compose` is installed on a
//! best-effort basis and only warned about when that fails.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{Engine, RuntimeSelection};
use crate::error::{StackupError, StackupResult, StepOutcome};
use crate::process::{CommandRunner, CommandSpec, ToolProbe};

/// Tools every run needs.
pub const REQUIRED_TOOLS: &[&str] = &["git", "curl"];

const PODMAN_COMPOSE: &str = "podman-compose";

/// Inputs to runtime selection.
#[derive(Debug, Clone, Default)]
pub struct RuntimePreferences {
    /// Try docker before podman
    pub prefer_docker: bool,
    /// Explicit compose command, used verbatim
    pub compose_override: Option<String>,
    /// Home directory, for locating `pip --user` installs
    pub home: Option<PathBuf>,
}

/// Fail with every missing tool named when any of `tools` is absent.
pub fn check_required_tools(probe: &dyn ToolProbe, tools: &[&str]) -> StackupResult<()> {
    let missing: Vec<String> = tools
        .iter()
        .filter(|tool| !probe.has(tool))
        .map(|tool| tool.to_string())
        .collect();

    if missing.is_empty() {
        debug!(?tools, "required tools present");
        Ok(())
    } else {
        Err(StackupError::MissingTools { tools: missing })
    }
}

/// Pick the compose command for this run.
pub fn resolve_runtime(
    probe: &dyn ToolProbe,
    runner: &dyn CommandRunner,
    prefs: &RuntimePreferences,
) -> StackupResult<(RuntimeSelection, StepOutcome)> {
    if let Some(selection) = prefs
        .compose_override
        .as_deref()
        .and_then(RuntimeSelection::from_override)
    {
        info!(command = %selection.command_line(), "using compose override");
        return Ok((selection, StepOutcome::Done));
    }

    let order = if prefs.prefer_docker {
        [Engine::Docker, Engine::Podman]
    } else {
        [Engine::Podman, Engine::Docker]
    };

    let engine = order
        .into_iter()
        .find(|engine| probe.has(engine.binary()))
        .ok_or_else(|| StackupError::NoContainerRuntime {
            tried: order.iter().map(|e| e.binary().to_string()).collect(),
        })?;

    match engine {
        Engine::Podman => Ok(podman_compose(probe, runner, prefs)),
        Engine::Docker => docker_compose(probe, runner).map(|sel| (sel, StepOutcome::Done)),
    }
}

fn podman_compose(
    probe: &dyn ToolProbe,
    runner: &dyn CommandRunner,
    prefs: &RuntimePreferences,
) -> (RuntimeSelection, StepOutcome) {
    if probe.has(PODMAN_COMPOSE) {
        return (
            RuntimeSelection::new(Engine::Podman, PODMAN_COMPOSE, &[]),
            StepOutcome::Done,
        );
    }

    let mut outcome = StepOutcome::Done;
    match install_podman_compose(probe, runner) {
        Ok(()) => info!("installed {PODMAN_COMPOSE}"),
        Err(reason) => {
            info!(%reason, "could not install {PODMAN_COMPOSE}");
            outcome.warn(format!(
                "{PODMAN_COMPOSE} is not installed and could not be installed automatically ({reason}); \
                 install it with `pip3 install podman-compose`"
            ));
        }
    }

    // pip --user installs land in ~/.local/bin, which is often not on PATH.
    let program = probe
        .locate(PODMAN_COMPOSE)
        .or_else(|| {
            prefs
                .home
                .as_ref()
                .map(|home| home.join(".local/bin").join(PODMAN_COMPOSE))
                .filter(|p| p.exists())
        })
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| PODMAN_COMPOSE.to_string());

    (RuntimeSelection::new(Engine::Podman, program, &[]), outcome)
}

fn install_podman_compose(
    probe: &dyn ToolProbe,
    runner: &dyn CommandRunner,
) -> Result<(), String> {
    let spec = if probe.has("pip3") {
        CommandSpec::new("pip3").args(["install", "--user", PODMAN_COMPOSE])
    } else if probe.has("brew") {
        CommandSpec::new("brew").args(["install", PODMAN_COMPOSE])
    } else {
        return Err("neither pip3 nor brew is available".to_string());
    };

    info!(command = %spec, "installing {PODMAN_COMPOSE}");
    let output = runner.run(&spec).map_err(|e| e.to_string())?;
    if output.success {
        Ok(())
    } else {
        Err(format!("`{spec}` exited with {:?}", output.code))
    }
}

fn docker_compose(
    probe: &dyn ToolProbe,
    runner: &dyn CommandRunner,
) -> StackupResult<RuntimeSelection> {
    let plugin = runner
        .run(&CommandSpec::new("docker").args(["compose", "version"]))
        .map(|out| out.success)
        .unwrap_or(false);
    if plugin {
        return Ok(RuntimeSelection::new(Engine::Docker, "docker", &["compose"]));
    }
    if probe.has("docker-compose") {
        return Ok(RuntimeSelection::new(Engine::Docker, "docker-compose", &[]));
    }
    Err(StackupError::ComposeMissing {
        runtime: "docker".to_string(),
        hint: "install the compose plugin: https://docs.docker.com/compose/install/".to_string(),
    })
}
