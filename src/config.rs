//! Application configuration management.
//!
//! Settings are layered with figment, lowest precedence first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file (platform config dir `config.toml`, or an explicit path)
//! 3. Environment variables prefixed `YELM_` (nested keys split on `__`,
//!    e.g. `YELM_MIGRATION__MAX_DEPTH=4`)
//!
//! Every load path validates the result, so a bad setting fails when the
//! configuration is built and never in the middle of a load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ContextFileError, Result};
use crate::patterns::{validate_hierarchy, DEFAULT_HIERARCHY};
use crate::scanner::{NameMatcher, ScanOptions, DEFAULT_IGNORE_PATTERNS, DEFAULT_MAX_DEPTH, DEFAULT_MAX_DIRS};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "YELM_";

/// Current global configuration directory name.
pub const CURRENT_GLOBAL_DIR: &str = ".yelm";

/// Legacy global configuration directory name.
pub const LEGACY_GLOBAL_DIR: &str = ".gemini";

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Settings for legacy-file detection and migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Filenames considered deprecated (matched case-insensitively).
    pub deprecated_patterns: Vec<String>,
    /// Global directory names considered deprecated.
    pub deprecated_global_dirs: Vec<String>,
    /// Depth limit of the detection walk.
    pub max_depth: usize,
    /// Entry limit of the detection walk.
    pub max_files: usize,
    /// Copy instead of rename/move.
    pub keep_originals: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            deprecated_patterns: strings(&["GEMINI.md"]),
            deprecated_global_dirs: strings(&[LEGACY_GLOBAL_DIR]),
            max_depth: 10,
            max_files: 10_000,
            keep_originals: false,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Priority-ordered context filenames; first wins.
    pub hierarchy: Vec<String>,
    /// Global directory names under the home directory, preferred first.
    pub global_dirs: Vec<String>,
    /// Entries whose presence marks a project root.
    pub project_markers: Vec<String>,
    /// Maximum depth of the downward scan.
    pub max_depth: usize,
    /// Maximum directories visited by the downward scan.
    pub max_dirs: usize,
    /// Directory names (or simple globs) never descended into.
    pub ignore_patterns: Vec<String>,
    /// Whether discovery results are cached.
    pub cache_enabled: bool,
    /// Maximum cached working directories.
    pub max_cache_size: usize,
    /// Maximum age of a cache entry in milliseconds.
    pub max_cache_age_ms: u64,
    /// Override for the user home directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_dir: Option<PathBuf>,
    /// Legacy detection and migration.
    pub migration: MigrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hierarchy: strings(DEFAULT_HIERARCHY),
            global_dirs: strings(&[CURRENT_GLOBAL_DIR, LEGACY_GLOBAL_DIR]),
            project_markers: strings(&[".git"]),
            max_depth: DEFAULT_MAX_DEPTH,
            max_dirs: DEFAULT_MAX_DIRS,
            ignore_patterns: strings(DEFAULT_IGNORE_PATTERNS),
            cache_enabled: true,
            max_cache_size: 64,
            max_cache_age_ms: 300_000,
            home_dir: None,
            migration: MigrationConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default platform-specific path plus environment.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from_path(&path),
            None => {
                log::debug!("No platform config directory, using defaults and environment");
                Self::extract(Self::base_figment().merge(Env::prefixed(ENV_PREFIX).split("__")))
            }
        }
    }

    /// Load from an explicit TOML file plus environment.
    ///
    /// A missing file is not an error; the defaults apply.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} not found, using defaults", path.display());
        }
        let figment = Self::base_figment()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| ContextFileError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "yelm", "yelm").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check every setting, failing on the first problem.
    pub fn validate(&self) -> Result<()> {
        validate_hierarchy(&self.hierarchy)?;

        if self.max_dirs == 0 {
            return Err(ContextFileError::Configuration(
                "max_dirs must be at least 1".to_string(),
            ));
        }
        if self.cache_enabled && self.max_cache_size == 0 {
            return Err(ContextFileError::Configuration(
                "max_cache_size must be at least 1 when the cache is enabled".to_string(),
            ));
        }
        for dir in self.global_dirs.iter().chain(&self.migration.deprecated_global_dirs) {
            if dir.trim().is_empty() || dir.contains('/') || dir.contains('\\') || dir == ".." {
                return Err(ContextFileError::Configuration(format!(
                    "invalid global directory name '{dir}'"
                )));
            }
        }
        if self.project_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ContextFileError::Configuration(
                "project markers must not be empty".to_string(),
            ));
        }
        if self.migration.max_files == 0 {
            return Err(ContextFileError::Configuration(
                "migration.max_files must be at least 1".to_string(),
            ));
        }
        NameMatcher::new(&self.ignore_patterns)?;
        Ok(())
    }

    /// The user's home directory: the override, else the platform value.
    #[must_use]
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir
            .clone()
            .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()))
    }

    /// Absolute global directory candidates, preferred first.
    #[must_use]
    pub fn global_dir_paths(&self) -> Vec<PathBuf> {
        self.home_dir()
            .map(|home| self.global_dirs.iter().map(|d| home.join(d)).collect())
            .unwrap_or_default()
    }

    /// Scanner options derived from these settings.
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.max_depth, self.max_dirs, self.ignore_patterns.clone())
    }

    /// Maximum cache entry age.
    #[must_use]
    pub fn max_cache_age(&self) -> Duration {
        Duration::from_millis(self.max_cache_age_ms)
    }
}
