//! Ignore handling for the scanner and the loader.
//!
//! Two independent mechanisms:
//!
//! - [`NameMatcher`]: directory basenames from configuration (`node_modules`,
//!   `*.egg-info`), compiled once with `globset`.
//! - [`IgnoreOracle`]: a caller-supplied "should this path be excluded"
//!   answer. [`GitignoreOracle`] is the stock implementation backed by the
//!   `ignore` crate's gitignore matcher.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{ContextFileError, Result};

/// Decides whether a path is excluded from discovery and loading.
pub trait IgnoreOracle: Send + Sync {
    /// Return `true` to exclude `path`.
    fn should_ignore(&self, path: &Path, is_dir: bool) -> bool;
}

/// Matches basenames against exact names or simple globs.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    set: GlobSet,
    patterns: Vec<String>,
}

impl NameMatcher {
    /// Compile patterns, failing on the first invalid one.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    ContextFileError::Configuration(format!(
                        "invalid ignore pattern '{pattern}': {e}"
                    ))
                })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| ContextFileError::Configuration(format!("ignore patterns: {e}")))?;
        Ok(Self {
            set,
            patterns: patterns.to_vec(),
        })
    }

    /// Compile patterns, logging and dropping invalid ones.
    #[must_use]
    pub fn lenient(patterns: &[String]) -> Self {
        let valid: Vec<String> = patterns
            .iter()
            .filter(|p| {
                let ok = GlobBuilder::new(p).build().is_ok();
                if !ok {
                    log::warn!("Invalid ignore pattern '{}', skipping", p);
                }
                ok
            })
            .cloned()
            .collect();
        Self::new(&valid).unwrap_or_else(|_| Self::empty())
    }

    /// A matcher that matches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    /// Whether `name` (a single path component) is ignored.
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.set.is_match(name)
    }

    /// The source patterns.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Gitignore-backed oracle rooted at a project directory.
#[derive(Debug)]
pub struct GitignoreOracle {
    root: PathBuf,
    matcher: Gitignore,
}

impl GitignoreOracle {
    /// Build from `<root>/.gitignore` (if present) plus extra lines.
    ///
    /// Returns `None` when no rule ends up in the matcher.
    #[must_use]
    pub fn from_root(root: &Path, extra_lines: &[String]) -> Option<Self> {
        let mut builder = GitignoreBuilder::new(root);

        let gitignore_path = root.join(".gitignore");
        if gitignore_path.is_file() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for line in extra_lines {
            if let Err(e) = builder.add_line(None, line) {
                log::warn!("Invalid ignore rule '{}': {}", line, e);
            }
        }

        match builder.build() {
            Ok(matcher) if !matcher.is_empty() => Some(Self {
                root: root.to_path_buf(),
                matcher,
            }),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore rules: {}", e);
                None
            }
        }
    }

    /// Root the rules are relative to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl IgnoreOracle for GitignoreOracle {
    fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        // Paths outside the root are never matched; the matcher panics on them.
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}
