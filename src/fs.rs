//! File helpers shared by the renderer, script emitter and cleanup.
//!
//! Every generated file goes through [`write_atomic`] so an interrupted run
//! leaves either the previous or the new version, never a truncated file.

use std::io::Write;
use std::path::Path;

use crate::error::StackupResult;

/// Write content to a file atomically, creating parent directories.
///
/// Uses the tempfile + rename pattern.
pub fn write_atomic(path: &Path, content: &str) -> StackupResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    // Temp files start out 0600; containers read these as another user.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Mark a file executable (0755). No-op on non-unix targets.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> StackupResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> StackupResult<()> {
    Ok(())
}

/// Remove a file or directory tree if present. Returns whether anything was removed.
pub fn remove_if_exists(path: &Path) -> StackupResult<bool> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)?;
        Ok(true)
    } else if path.exists() {
        std::fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
