//! Day-two operations on a running stack

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::RuntimeSelection;
use crate::error::StackupResult;
use crate::launch::{probe_all, run_compose, HealthReport, HttpProbe};
use crate::process::CommandRunner;
use crate::render::{env_file, ArtifactKind, DASHBOARDS_DIR};
use crate::scripts::HELPER_SCRIPTS;
use crate::source::CONTRIB_DIR;

/// The compose command the last setup run recorded in `.env`.
///
/// `None` when the file is absent or has no `COMPOSE_CMD` entry.
pub fn saved_runtime(work_dir: &Path) -> StackupResult<Option<RuntimeSelection>> {
    let path = work_dir.join(ArtifactKind::EnvFile.path());
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let selection = env_file::parse(&content)?
        .get("COMPOSE_CMD")
        .and_then(|cmd| RuntimeSelection::from_override(cmd));
    if let Some(sel) = &selection {
        debug!(command = %sel.command_line(), "using compose command from .env");
    }
    Ok(selection)
}

/// `<compose> ps` followed by the health probes.
pub fn status(
    runner: &dyn CommandRunner,
    http: &dyn HttpProbe,
    runtime: &RuntimeSelection,
    work_dir: &Path,
) -> StackupResult<HealthReport> {
    run_compose(runner, runtime, work_dir, &["ps"])?;
    Ok(probe_all(http))
}

pub fn down(
    runner: &dyn CommandRunner,
    runtime: &RuntimeSelection,
    work_dir: &Path,
) -> StackupResult<()> {
    run_compose(runner, runtime, work_dir, &["down"])
}

pub fn restart(
    runner: &dyn CommandRunner,
    runtime: &RuntimeSelection,
    work_dir: &Path,
    service: Option<&str>,
) -> StackupResult<()> {
    let mut args = vec!["restart"];
    args.extend(service);
    run_compose(runner, runtime, work_dir, &args)
}

pub fn logs(
    runner: &dyn CommandRunner,
    runtime: &RuntimeSelection,
    work_dir: &Path,
    service: Option<&str>,
    follow: bool,
) -> StackupResult<()> {
    let mut args = vec!["logs"];
    if follow {
        args.push("-f");
    }
    args.extend(service);
    run_compose(runner, runtime, work_dir, &args)
}

/// Stop the stack, drop its volumes and remove everything stackup generated.
///
/// Backups and credentials are kept. Returns the removed paths.
pub fn cleanup(
    runner: &dyn CommandRunner,
    runtime: &RuntimeSelection,
    work_dir: &Path,
) -> StackupResult<Vec<PathBuf>> {
    if work_dir.join(ArtifactKind::Compose.path()).exists() {
        run_compose(runner, runtime, work_dir, &["down", "-v"])?;
    } else {
        info!("no compose file; skipping compose down");
    }

    let mut targets: Vec<&str> = ArtifactKind::ALL.iter().map(|k| k.path()).collect();
    targets.extend(HELPER_SCRIPTS.iter().map(|(name, _)| *name));
    targets.extend([
        "prometheus",
        "grafana/provisioning",
        DASHBOARDS_DIR,
        "grafana",
        CONTRIB_DIR,
    ]);

    let mut removed = Vec::new();
    for rel in targets {
        let path = work_dir.join(rel);
        // Directories are only removed once empty, so user files survive.
        let gone = if path.is_dir() && rel != CONTRIB_DIR {
            remove_empty_tree(&path)?
        } else {
            crate::fs::remove_if_exists(&path)?
        };
        if gone {
            info!(path = %path.display(), "removed");
            removed.push(path);
        }
    }
    Ok(removed)
}

/// Remove `dir` and its empty subdirectories; true when `dir` itself went away.
fn remove_empty_tree(dir: &Path) -> StackupResult<bool> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            remove_empty_tree(&path)?;
        }
    }
    if std::fs::read_dir(dir)?.next().is_none() {
        std::fs::remove_dir(dir)?;
        return Ok(true);
    }
    Ok(false)
}
