//! Scanner module for bounded directory traversal and file indexing.
//!
//! This module provides functionality for:
//! - Breadth-first directory traversal with depth and directory-count caps
//! - Directory-name ignore patterns and gitignore-style oracles
//! - A one-pass file index used to pick the winning context file per directory
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Breadth-first traversal producing a [`ScanResult`]
//! - [`index`]: Lookup maps over a scan and per-directory winner selection
//! - [`ignore_rules`]: Name matchers and ignore oracles
//! - [`path_utils`]: Path identity and display helpers
//!
//! # Example
//!
//! ```no_run
//! use yelm_context::patterns::{PatternRegistry, DEFAULT_HIERARCHY};
//! use yelm_context::scanner::{build_file_index, find_context_files, DirectoryScanner, ScanOptions};
//! use std::path::Path;
//!
//! let scan = DirectoryScanner::new(Path::new("."), ScanOptions::default())
//!     .scan()
//!     .unwrap();
//! let index = build_file_index(&scan);
//! let registry = PatternRegistry::new(DEFAULT_HIERARCHY).unwrap();
//! for (dir, winner) in find_context_files(&index, &registry) {
//!     println!("{}: {}", dir.display(), winner.pattern_name);
//! }
//! ```

pub mod ignore_rules;
pub mod index;
pub mod path_utils;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

pub use ignore_rules::{GitignoreOracle, IgnoreOracle, NameMatcher};
pub use index::{build_file_index, find_context_files, ContextMatch, FileIndex};
pub use walker::DirectoryScanner;

/// Default maximum traversal depth below the scan root.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Default cap on directories accepted by one scan.
pub const DEFAULT_MAX_DIRS: usize = 200;

/// Directory names skipped by default.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    ".next",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
];

/// One physical file seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIndexEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Basename
    pub name: String,
    /// Containing directory
    pub directory: PathBuf,
    /// Path relative to the scan root, forward-slash separated
    pub relative_path: String,
    /// Last modification time
    #[serde(skip)]
    pub modified: SystemTime,
    /// File size in bytes
    pub size: u64,
    /// Depth of the containing directory (0 = scan root)
    pub depth: usize,
}

/// A directory the scanner accepted, with the mtime observed when listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDirectory {
    /// Directory path as traversed
    pub path: PathBuf,
    /// Modification time when it was read
    pub modified: Option<SystemTime>,
    /// Depth below the scan root
    pub depth: usize,
}

/// Limits and filters for a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directories deeper than this are skipped (root = 0).
    pub max_depth: usize,

    /// Once this many directories are accepted, no more are.
    pub max_dirs: usize,

    /// Directory basenames to skip (exact names or simple globs).
    pub ignore_patterns: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_dirs: DEFAULT_MAX_DIRS,
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl ScanOptions {
    /// Create options with explicit limits.
    #[must_use]
    pub fn new(max_depth: usize, max_dirs: usize, ignore_patterns: Vec<String>) -> Self {
        Self {
            max_depth,
            max_dirs,
            ignore_patterns,
        }
    }
}

/// Outcome of one traversal.
///
/// `limit_reached` is informational: the files collected are still a
/// consistent view of every directory that was accepted.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// The scan root
    pub root: PathBuf,
    /// Every regular file found in accepted directories
    pub files: Vec<FileIndexEntry>,
    /// Every accepted directory
    pub directories: Vec<ScannedDirectory>,
    /// Number of directories accepted
    pub directories_scanned: usize,
    /// Whether `max_dirs` cut the traversal short
    pub limit_reached: bool,
    /// Directories skipped because they could not be read
    pub unreadable_dirs: usize,
    /// Wall-clock duration of the scan
    pub duration_ms: u64,
}

impl ScanResult {
    /// Sum of file sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}
