//! Ignore-list maintenance
//!
//! Lines are compared exactly, surrounding whitespace included; an existing
//! file is only ever appended to.

use std::path::Path;

use crate::error::StackupResult;

pub const IGNORE_FILE: &str = ".gitignore";

/// Written when no ignore file exists yet.
pub const INITIAL_IGNORE_PATTERNS: &[&str] = &[".env", "credentials/", "backups/", "*.log"];

/// Make sure every pattern in `required` is present in the ignore file at
/// `path`, returning the patterns that were added.
pub fn ensure_ignore_entries(path: &Path, required: &[&str]) -> StackupResult<Vec<String>> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    let Some(content) = existing else {
        let mut patterns: Vec<String> =
            INITIAL_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect();
        for pattern in required {
            if !patterns.iter().any(|p| p == pattern) {
                patterns.push(pattern.to_string());
            }
        }
        let mut out = patterns.join("\n");
        out.push('\n');
        crate::fs::write_atomic(path, &out)?;
        return Ok(patterns);
    };

    let added = missing_patterns(&content, required);
    if added.is_empty() {
        return Ok(added);
    }

    let mut out = content;
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for pattern in &added {
        out.push_str(pattern);
        out.push('\n');
    }
    crate::fs::write_atomic(path, &out)?;
    Ok(added)
}

fn missing_patterns(content: &str, required: &[&str]) -> Vec<String> {
    let mut added: Vec<String> = Vec::new();
    for pattern in required {
        let present = content.lines().any(|line| line == *pattern)
            || added.iter().any(|a| a == pattern);
        if !present {
            added.push(pattern.to_string());
        }
    }
    added
}
