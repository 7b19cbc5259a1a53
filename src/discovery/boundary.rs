//! Project boundary detection for the upward walk.

use std::path::{Path, PathBuf};

use crate::scanner::path_utils::is_within;

/// First ancestor of `start` (inclusive) containing any marker entry.
#[must_use]
pub fn find_project_root(start: &Path, markers: &[String]) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| markers.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

/// Where the upward walk stops (inclusive).
///
/// The project root if one exists; otherwise the home directory when the
/// working directory lies beneath it; otherwise the working directory
/// itself.
#[must_use]
pub fn upward_stop(working_dir: &Path, markers: &[String], home: Option<&Path>) -> PathBuf {
    if let Some(root) = find_project_root(working_dir, markers) {
        return root;
    }
    match home {
        Some(home) if is_within(working_dir, home) => home.to_path_buf(),
        _ => working_dir.to_path_buf(),
    }
}
