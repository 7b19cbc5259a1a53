//! Breadth-first directory scanner.
//!
//! # Overview
//!
//! [`DirectoryScanner`] walks a subtree level by level from a root, building
//! the flat file list that [`super::index`] turns into lookup maps. The
//! traversal is bounded two ways: directories deeper than `max_depth` are
//! skipped, and once `max_dirs` directories have been accepted no further
//! directory is read. Queued entries are still drained so the result is a
//! consistent picture of every accepted directory.
//!
//! A directory is skipped when it was already visited (by canonical path,
//! which also breaks symlink cycles), when it is too deep, when its
//! basename matches an ignore pattern, or when the ignore oracle excludes
//! it. The root is exempt from name patterns.
//!
//! Unreadable subdirectories are logged and skipped. Only an inaccessible
//! root, or a root that is not a directory, fails the scan.
//!
//! # Example
//!
//! ```no_run
//! use yelm_context::scanner::{DirectoryScanner, ScanOptions};
//! use std::path::Path;
//!
//! let options = ScanOptions { max_dirs: 50, ..Default::default() };
//! let result = DirectoryScanner::new(Path::new("."), options).scan().unwrap();
//! println!(
//!     "{} files in {} directories (limit reached: {})",
//!     result.files.len(),
//!     result.directories_scanned,
//!     result.limit_reached
//! );
//! ```

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use super::ignore_rules::{IgnoreOracle, NameMatcher};
use super::path_utils::{directory_key, file_name_string};
use super::{FileIndexEntry, ScanOptions, ScanResult, ScannedDirectory};
use crate::error::{ContextFileError, Result};

/// Bounded breadth-first scanner.
pub struct DirectoryScanner {
    /// Root path to scan
    root: PathBuf,
    /// Scan limits
    options: ScanOptions,
    /// Compiled directory-name patterns
    names: NameMatcher,
    /// Optional gitignore-style oracle
    oracle: Option<Arc<dyn IgnoreOracle>>,
}

impl std::fmt::Debug for DirectoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryScanner")
            .field("root", &self.root)
            .field("options", &self.options)
            .field("has_oracle", &self.oracle.is_some())
            .finish()
    }
}

impl DirectoryScanner {
    /// Create a scanner for the given root.
    ///
    /// Invalid ignore patterns are logged and dropped; configuration
    /// validation rejects them earlier on the normal path.
    #[must_use]
    pub fn new(root: &Path, options: ScanOptions) -> Self {
        let names = NameMatcher::lenient(&options.ignore_patterns);
        Self {
            root: root.to_path_buf(),
            options,
            names,
            oracle: None,
        }
    }

    /// Attach an ignore oracle consulted for every directory and file.
    #[must_use]
    pub fn with_ignore_oracle(mut self, oracle: Option<Arc<dyn IgnoreOracle>>) -> Self {
        self.oracle = oracle;
        self
    }

    fn oracle_ignores(&self, path: &Path, is_dir: bool) -> bool {
        self.oracle
            .as_ref()
            .is_some_and(|o| o.should_ignore(path, is_dir))
    }

    /// Check the root before traversal.
    fn check_root(&self) -> Result<()> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| ContextFileError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ContextFileError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Run the traversal.
    ///
    /// # Errors
    ///
    /// Fails only if the root is missing, unreadable, or not a directory.
    pub fn scan(&self) -> Result<ScanResult> {
        let started = Instant::now();
        self.check_root()?;

        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut files = Vec::new();
        let mut directories = Vec::new();
        let mut limit_reached = false;
        let mut unreadable_dirs = 0;

        queue.push_back((self.root.clone(), 0));

        while let Some((dir, depth)) = queue.pop_front() {
            if !visited.insert(directory_key(&dir)) {
                log::trace!("Already visited: {}", dir.display());
                continue;
            }
            if depth > self.options.max_depth {
                log::trace!("Too deep ({}): {}", depth, dir.display());
                continue;
            }
            if depth > 0 && self.names.is_match(&file_name_string(&dir)) {
                log::trace!("Ignoring directory by name: {}", dir.display());
                continue;
            }
            if depth > 0 && self.oracle_ignores(&dir, true) {
                log::trace!("Ignoring directory by oracle: {}", dir.display());
                continue;
            }
            if directories.len() >= self.options.max_dirs {
                // Keep draining so every queued path is accounted for.
                limit_reached = true;
                continue;
            }

            let read_dir = match std::fs::read_dir(&dir) {
                Ok(rd) => rd,
                Err(e) if depth == 0 => return Err(ContextFileError::from_io(&dir, e)),
                Err(e) => {
                    log::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                    unreadable_dirs += 1;
                    continue;
                }
            };

            let modified = std::fs::metadata(&dir).and_then(|m| m.modified()).ok();
            directories.push(ScannedDirectory {
                path: dir.clone(),
                modified,
                depth,
            });

            let mut children: Vec<_> = read_dir
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        log::warn!("Failed to read entry in {}: {}", dir.display(), e);
                        None
                    }
                })
                .collect();
            // Sort children for deterministic output
            children.sort_by_key(std::fs::DirEntry::file_name);

            for child in children {
                let path = child.path();
                // Follow symlinks; the visited set guards against cycles.
                let metadata = match std::fs::metadata(&path) {
                    Ok(m) => m,
                    Err(e) => {
                        log::debug!("Cannot stat {}: {}", path.display(), e);
                        continue;
                    }
                };

                if metadata.is_dir() {
                    queue.push_back((path, depth + 1));
                } else if metadata.is_file() {
                    if self.oracle_ignores(&path, false) {
                        log::trace!("Ignoring file by oracle: {}", path.display());
                        continue;
                    }
                    files.push(self.index_entry(path, &dir, depth, &metadata));
                }
            }
        }

        let directories_scanned = directories.len();
        if limit_reached {
            log::warn!(
                "Directory limit of {} reached while scanning {}; results are partial",
                self.options.max_dirs,
                self.root.display()
            );
        }
        log::debug!(
            "Scanned {} directories, {} files under {} in {:?}",
            directories_scanned,
            files.len(),
            self.root.display(),
            started.elapsed()
        );

        Ok(ScanResult {
            root: self.root.clone(),
            files,
            directories,
            directories_scanned,
            limit_reached,
            unreadable_dirs,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    fn index_entry(
        &self,
        path: PathBuf,
        dir: &Path,
        depth: usize,
        metadata: &std::fs::Metadata,
    ) -> FileIndexEntry {
        let relative_path = path
            .strip_prefix(&self.root)
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_else(|_| path.to_string_lossy().into_owned());

        FileIndexEntry {
            name: file_name_string(&path),
            directory: dir.to_path_buf(),
            relative_path,
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size: metadata.len(),
            depth,
            path,
        }
    }
}
