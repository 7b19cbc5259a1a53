//! Hierarchical discovery of context instruction files.
//!
//! Discovery combines four sources, each contributing at most one file per
//! physical directory:
//!
//! 1. **Global**: the first global directory under the home directory that
//!    holds any hierarchy pattern (level `-1`).
//! 2. **Upward**: the working directory and its ancestors up to the project
//!    boundary (level `0` for the working directory, `+1` per step up).
//! 3. **Downward**: a bounded scan beneath the working directory (level =
//!    scan depth).
//! 4. **Extensions**: caller-supplied files, sorted last.
//!
//! The result is ordered from the most general context to the most
//! specific: global, then the boundary down to the working directory, then
//! descendants by depth, then extension files.

mod boundary;
mod resolver;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use boundary::{find_project_root, upward_stop};
pub use resolver::HierarchyResolver;

use crate::scanner::IgnoreOracle;

/// `directory_level` of files from a global directory.
pub const GLOBAL_LEVEL: i32 = -1;

/// `directory_level` of extension-supplied files.
pub const EXTENSION_LEVEL: i32 = i32::MAX;

/// Which discovery step produced a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    /// A global configuration directory
    Global,
    /// The working directory or one of its ancestors
    Upward,
    /// A descendant of the working directory
    Downward,
    /// Supplied by the caller
    Extension,
}

/// A winning context file. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredFile {
    /// Absolute path to the file
    pub absolute_path: PathBuf,
    /// Directory the file wins for (for nested patterns, above the subdir)
    pub directory: PathBuf,
    /// Hierarchy entry that matched, or the basename for extension files
    pub pattern_name: String,
    /// Priority of that entry; lower wins
    pub priority: u32,
    /// Modification time when discovered
    pub last_modified_at: Option<DateTime<Utc>>,
    /// -1 global, 0 working dir, +n ancestors or descendants, sentinel for extensions
    pub directory_level: i32,
    /// Discovery step that produced the file
    pub source: DiscoverySource,
}

impl DiscoveredFile {
    pub(crate) fn new(
        absolute_path: PathBuf,
        directory: PathBuf,
        pattern_name: String,
        priority: u32,
        directory_level: i32,
        source: DiscoverySource,
    ) -> Self {
        let last_modified_at = std::fs::metadata(&absolute_path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Self {
            absolute_path,
            directory,
            pattern_name,
            priority,
            last_modified_at,
            directory_level,
            source,
        }
    }

    /// Basename of the file.
    #[must_use]
    pub fn file_name(&self) -> String {
        crate::scanner::path_utils::file_name_string(&self.absolute_path)
    }
}

/// Input to one discovery (and load) call.
#[derive(Clone, Default)]
pub struct DiscoveryRequest {
    /// Directory the caller is working in
    pub working_dir: PathBuf,
    /// Absolute paths supplied by extensions
    pub extension_files: Vec<PathBuf>,
    /// Optional gitignore-style oracle
    pub ignore_oracle: Option<Arc<dyn IgnoreOracle>>,
    /// Log per-step summaries at info level
    pub debug: bool,
}

impl std::fmt::Debug for DiscoveryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryRequest")
            .field("working_dir", &self.working_dir)
            .field("extension_files", &self.extension_files)
            .field("has_ignore_oracle", &self.ignore_oracle.is_some())
            .field("debug", &self.debug)
            .finish()
    }
}

impl DiscoveryRequest {
    /// Request for `working_dir` with no extensions or oracle.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Self::default()
        }
    }

    /// Add extension-supplied files.
    #[must_use]
    pub fn with_extension_files(mut self, files: Vec<PathBuf>) -> Self {
        self.extension_files = files;
        self
    }

    /// Attach an ignore oracle.
    #[must_use]
    pub fn with_ignore_oracle(mut self, oracle: Option<Arc<dyn IgnoreOracle>>) -> Self {
        self.ignore_oracle = oracle;
        self
    }

    /// Toggle step-summary logging at info level.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Files from the filesystem steps plus the directory mtimes they depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Winning files in resolution order
    pub files: Vec<DiscoveredFile>,
    /// Directories whose listing the result depends on
    pub directory_mod_times: HashMap<PathBuf, SystemTime>,
}

impl Resolution {
    /// Record the current mtime of `dir`, if it exists.
    pub(crate) fn track(&mut self, dir: &Path) {
        if let Ok(modified) = std::fs::metadata(dir).and_then(|m| m.modified()) {
            self.directory_mod_times.insert(dir.to_path_buf(), modified);
        }
    }
}
