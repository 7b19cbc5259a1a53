//! Detection and migration of legacy context files.
//!
//! # Overview
//!
//! Older setups name their context files with a deprecated pattern
//! (`GEMINI.md`) or keep global context in a deprecated global directory
//! (`~/.gemini`). This module:
//! - finds such files with a bounded walk ([`detect`])
//! - plans a target for each and reports conflicts ([`plan`])
//! - renames, moves or copies them ([`execute`])
//!
//! Migration is opt-in. Discovery never migrates anything by itself.
//!
//! # Atomicity
//!
//! Execution is not atomic. Every file's outcome is recorded on its own in
//! [`MigrationResult`]; a failure part-way through does not roll back files
//! that were already migrated.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use yelm_context::config::Config;
//! use yelm_context::migration::{DetectOptions, MigrationService};
//!
//! let config = Arc::new(Config::default());
//! let service = MigrationService::new(config.clone()).unwrap();
//! let legacy = service.detect_legacy_files(Path::new("."), &DetectOptions::from_config(&config));
//! let plan = service.suggest_migration(&legacy);
//! if service.can_auto_migrate(&plan) {
//!     let result = service.execute_migration(&plan, false);
//!     println!("{}", result.summary);
//! }
//! ```

pub mod detect;
pub mod execute;
pub mod plan;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, CURRENT_GLOBAL_DIR};
use crate::error::Result;
use crate::patterns::PatternRegistry;

/// Why a file was flagged as legacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyKind {
    /// The file name is a deprecated pattern
    DeprecatedName,
    /// The file lives in a deprecated global directory
    DeprecatedGlobalDir,
}

/// A file that should be migrated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LegacyFile {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Why it was flagged
    pub kind: LegacyKind,
}

/// Limits of the detection walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectOptions {
    /// Deepest directory level visited below the working directory
    pub max_depth: usize,
    /// Stop after examining this many files
    pub max_files: usize,
    /// Also collect files in deprecated global directories
    pub include_global: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl DetectOptions {
    /// Options taken from the migration settings.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_depth: config.migration.max_depth,
            max_files: config.migration.max_files,
            include_global: true,
        }
    }

    /// Toggle global directory collection.
    #[must_use]
    pub fn with_include_global(mut self, include_global: bool) -> Self {
        self.include_global = include_global;
        self
    }
}

/// File operation used for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationAction {
    /// Rename within the same directory
    Rename,
    /// Move into another directory
    Move,
    /// Copy, leaving the original in place
    Copy,
}

/// One planned file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationCandidate {
    /// Where the file is now
    pub current_path: PathBuf,
    /// Where it should go
    pub suggested_path: PathBuf,
    /// How it gets there
    pub action: MigrationAction,
    /// Hierarchy priority of the current name
    pub priority: u32,
    /// Why the file was flagged
    pub kind: LegacyKind,
}

/// Why a target is contested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// Several candidates map to the same target
    Collision,
    /// The target already exists on disk
    TargetExists,
}

/// A target that blocks automatic migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationConflict {
    /// Contested target path
    pub target: PathBuf,
    /// Candidates that map to it
    pub sources: Vec<PathBuf>,
    /// What is wrong with it
    pub reason: ConflictReason,
}

/// The full migration proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    /// Planned operations, in detection order
    pub candidates: Vec<MigrationCandidate>,
    /// Problems that block automatic execution
    pub conflicts: Vec<MigrationConflict>,
    /// Human-readable notes about the plan
    pub warnings: Vec<String>,
}

impl MigrationPlan {
    /// Whether there is nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// A completed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedFile {
    /// Original location
    pub from: PathBuf,
    /// New location
    pub to: PathBuf,
    /// Operation performed
    pub action: MigrationAction,
}

/// A failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMigration {
    /// File that was not migrated
    pub file: PathBuf,
    /// What went wrong
    pub error: String,
}

/// Outcome of [`MigrationService::execute_migration`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    /// True when no candidate failed
    pub success: bool,
    /// Completed operations
    pub migrated: Vec<MigratedFile>,
    /// Failed operations
    pub failed: Vec<FailedMigration>,
    /// One-line summary
    pub summary: String,
}

/// Error for a single file operation.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Source vanished after planning.
    #[error("source not found: {0}")]
    SourceMissing(PathBuf),

    /// Target appeared and overwriting was not requested.
    #[error("target already exists: {0}")]
    TargetExists(PathBuf),

    /// An earlier file in this run already took the target.
    #[error("target already written in this run: {0}")]
    TargetTaken(PathBuf),

    /// The plan had conflicts and execution was not forced.
    #[error("migration blocked by {0} conflict(s); rerun with force to override")]
    Blocked(usize),

    /// Filesystem failure.
    #[error("{action} failed for {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Detects, plans and executes migrations.
#[derive(Debug, Clone)]
pub struct MigrationService {
    config: Arc<Config>,
    registry: PatternRegistry,
}

impl MigrationService {
    /// Create a service; fails if the configuration is invalid.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        config.validate()?;
        let registry = PatternRegistry::new(&config.hierarchy)?;
        Ok(Self { config, registry })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find legacy files under `working_dir` (and optionally in deprecated
    /// global directories).
    #[must_use]
    pub fn detect_legacy_files(&self, working_dir: &Path, options: &DetectOptions) -> Vec<LegacyFile> {
        detect::detect_legacy_files(&self.config, &self.registry, working_dir, options)
    }

    /// Plan a target for every legacy file.
    #[must_use]
    pub fn suggest_migration(&self, files: &[LegacyFile]) -> MigrationPlan {
        plan::suggest_migration(&self.config, &self.registry, files)
    }

    /// Whether `plan` can run without `force`.
    #[must_use]
    pub fn can_auto_migrate(&self, plan: &MigrationPlan) -> bool {
        plan.conflicts.is_empty()
    }

    /// Carry out `plan`.
    ///
    /// A plan with conflicts migrates nothing unless `force` is set.
    #[must_use]
    pub fn execute_migration(&self, plan: &MigrationPlan, force: bool) -> MigrationResult {
        execute::execute_migration(plan, force)
    }

    /// Global directory legacy files move into: the first configured global
    /// directory that is not deprecated.
    fn current_global_dir_name(config: &Config) -> String {
        config
            .global_dirs
            .iter()
            .find(|d| !config.migration.deprecated_global_dirs.contains(d))
            .cloned()
            .unwrap_or_else(|| CURRENT_GLOBAL_DIR.to_string())
    }

    /// Whether `name` is a deprecated file name.
    fn is_deprecated_name(config: &Config, name: &str) -> bool {
        config
            .migration
            .deprecated_patterns
            .iter()
            .any(|p| p.eq_ignore_ascii_case(name))
    }

    /// Absolute deprecated global directories.
    fn deprecated_global_paths(config: &Config) -> Vec<PathBuf> {
        config
            .home_dir()
            .map(|home| {
                config
                    .migration
                    .deprecated_global_dirs
                    .iter()
                    .map(|d| home.join(d))
                    .collect()
            })
            .unwrap_or_default()
    }
}
