//! Timestamped backups of previously generated files

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::StackupResult;

pub const BACKUP_DIR: &str = "backups";

/// Directory name for a backup taken at `now`.
pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d-%H%M%S").to_string()
}

/// Copy each existing file in `relative_paths` into `backups/<stamp>/`,
/// keeping its relative layout.
///
/// The backup directory is only created when at least one file exists.
pub fn backup_existing(
    work_dir: &Path,
    relative_paths: &[&str],
    stamp: &str,
) -> StackupResult<Option<PathBuf>> {
    let target = work_dir.join(BACKUP_DIR).join(stamp);
    let mut created = false;

    for rel in relative_paths {
        let source = work_dir.join(rel);
        if !source.is_file() {
            continue;
        }
        let dest = target.join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&source, &dest)?;
        debug!(file = %rel, "backed up");
        created = true;
    }

    Ok(created.then_some(target))
}
