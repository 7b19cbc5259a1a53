//! JSON output for command results.
//!
//! Every document carries the payload plus the exit code, so scripts can
//! branch on one field:
//!
//! ```json
//! {
//!   "result": { "content": "...", "file_count": 1, "files": [...], "file_names": ["agents.md"] },
//!   "exit_code": 0,
//!   "exit_code_name": "YC000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::cache::CacheMetrics;
use crate::error::ExitCode;
use crate::manager::LoadedContext;
use crate::migration::{MigrationPlan, MigrationResult};
use crate::scanner::ScanResult;

/// Payload of `load --output json`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonLoad<'a> {
    /// The combined context
    #[serde(flatten)]
    pub context: &'a LoadedContext,
    /// Cache counters, when a cache was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheMetrics>,
}

/// Payload of `scan --output json`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonScanSummary {
    /// Scan root
    pub root: String,
    /// Directories accepted
    pub directories_scanned: usize,
    /// Files indexed
    pub files: usize,
    /// Total size of indexed files in bytes
    pub total_size: u64,
    /// Whether `max_dirs` stopped the scan
    pub limit_reached: bool,
    /// Directories that could not be listed
    pub unreadable_dirs: usize,
    /// Duration of the scan in milliseconds
    pub duration_ms: u64,
    /// Relative paths of indexed files
    pub paths: Vec<String>,
}

impl JsonScanSummary {
    /// Summarize a scan.
    #[must_use]
    pub fn from_scan_result(result: &ScanResult) -> Self {
        Self {
            root: result.root.to_string_lossy().into_owned(),
            directories_scanned: result.directories_scanned,
            files: result.files.len(),
            total_size: result.total_size(),
            limit_reached: result.limit_reached,
            unreadable_dirs: result.unreadable_dirs,
            duration_ms: result.duration_ms,
            paths: result.files.iter().map(|f| f.relative_path.clone()).collect(),
        }
    }
}

/// Payload of `migrate --output json`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMigration<'a> {
    /// The plan
    pub plan: &'a MigrationPlan,
    /// Whether the plan can run without `--force`
    pub can_auto_migrate: bool,
    /// Execution outcome, when `--execute` was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a MigrationResult>,
}

/// A payload wrapped with the exit code.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<T: Serialize> {
    /// Command payload
    pub result: T,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "YC000")
    pub exit_code_name: String,
}

impl<T: Serialize> JsonOutput<T> {
    /// Wrap `result` with `exit_code`.
    #[must_use]
    pub fn new(result: T, exit_code: ExitCode) -> Self {
        Self {
            result,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)
    }
}
