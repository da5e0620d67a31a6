//! Collector sources for development mode
//!
//! Dev mode runs a collector built from a local clone of
//! opentelemetry-collector-contrib instead of the released image.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::RuntimeSelection;
use crate::error::{StackupError, StackupResult, StepOutcome};
use crate::process::{CommandRunner, CommandSpec};

pub const CONTRIB_REPO_URL: &str =
    "https://github.com/open-telemetry/opentelemetry-collector-contrib.git";
/// Directory name of the clone inside the working directory.
pub const CONTRIB_DIR: &str = "opentelemetry-collector-contrib";
/// Image tag produced by the contrib Makefile.
const BUILT_IMAGE: &str = "otelcontribcol:latest";

/// Which dev-mode steps to perform.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceOptions {
    pub skip_clone: bool,
    pub skip_build: bool,
}

/// Path of the clone for `work_dir`.
pub fn contrib_dir(work_dir: &Path) -> PathBuf {
    work_dir.join(CONTRIB_DIR)
}

/// Clone the contrib sources, or fast-forward an existing clone.
///
/// A failed pull keeps the stale copy and is only a warning; a failed fresh
/// clone is fatal.
pub fn sync_sources(runner: &dyn CommandRunner, work_dir: &Path) -> StackupResult<StepOutcome> {
    let dir = contrib_dir(work_dir);

    if dir.join(".git").exists() {
        let spec = CommandSpec::new("git")
            .arg("-C")
            .arg(dir.display().to_string())
            .args(["pull", "--ff-only"]);
        info!(command = %spec, "updating collector sources");
        let output = runner.run(&spec)?;
        if output.success {
            return Ok(StepOutcome::Done);
        }
        info!(stderr = %output.stderr.trim(), "pull failed");
        return Ok(StepOutcome::warning(format!(
            "could not update {}; building from the existing copy ({})",
            dir.display(),
            output.stderr.trim()
        )));
    }

    let spec = CommandSpec::new("git")
        .args(["clone", "--depth", "1", CONTRIB_REPO_URL])
        .arg(dir.display().to_string())
        .interactive(true);
    info!(command = %spec, "cloning collector sources");
    let output = runner.run(&spec)?;
    if !output.success {
        return Err(StackupError::CloneFailed {
            url: CONTRIB_REPO_URL.to_string(),
            message: format!("git exited with {:?}", output.code),
        });
    }
    Ok(StepOutcome::Done)
}

/// Build the collector image from the clone and tag it as `image`.
pub fn build_dev_image(
    runner: &dyn CommandRunner,
    runtime: &RuntimeSelection,
    work_dir: &Path,
    image: &str,
) -> StackupResult<()> {
    let dir = contrib_dir(work_dir);
    if !dir.is_dir() {
        return Err(StackupError::BuildFailed(format!(
            "{} does not exist; run without --skip-clone first",
            dir.display()
        )));
    }

    let make = CommandSpec::new("make")
        .arg("docker-otelcontribcol")
        .current_dir(&dir)
        .interactive(true);
    info!(command = %make, "building collector image");
    let output = runner.run(&make).map_err(|e| {
        StackupError::BuildFailed(format!("could not run `{make}`: {e}"))
    })?;
    if !output.success {
        return Err(StackupError::BuildFailed(format!(
            "`{make}` exited with {:?}",
            output.code
        )));
    }

    let tag = CommandSpec::new(runtime.engine.binary()).args(["tag", BUILT_IMAGE, image]);
    let output = runner.run(&tag)?;
    if !output.success {
        return Err(StackupError::BuildFailed(format!(
            "`{tag}` failed: {}",
            output.stderr.trim()
        )));
    }
    info!(image, "tagged development image");
    Ok(())
}

/// Run the dev-mode source steps selected by `opts`.
pub fn prepare_dev_collector(
    runner: &dyn CommandRunner,
    runtime: &RuntimeSelection,
    work_dir: &Path,
    image: &str,
    opts: SourceOptions,
) -> StackupResult<StepOutcome> {
    let outcome = if opts.skip_clone {
        info!("skipping source clone");
        StepOutcome::Done
    } else {
        sync_sources(runner, work_dir)?
    };

    if opts.skip_build {
        info!("skipping image build");
    } else {
        build_dev_image(runner, runtime, work_dir, image)?;
    }
    Ok(outcome)
}
