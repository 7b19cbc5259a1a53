//! Structured error handling and exit codes.
//!
//! Library operations return [`ContextFileError`]. Every variant carries a
//! stable [`ErrorCode`] so callers can branch on the failure class without
//! matching on message text.
//!
//! Only configuration and integrity failures surface here. Unreadable
//! directories and files met during discovery are logged and skipped.

use std::path::PathBuf;

use serde::Serialize;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ContextFileError>;

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A path expected to be a directory is something else.
    NotADirectory,
    /// A required path does not exist.
    NotFound,
    /// A directory or file could not be accessed.
    PermissionDenied,
    /// The filename hierarchy is malformed.
    InvalidHierarchy,
    /// Any other invalid setting.
    ConfigurationError,
    /// Unclassified I/O failure.
    IoError,
}

impl ErrorCode {
    /// The code as it appears in structured output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotADirectory => "NOT_A_DIRECTORY",
            Self::NotFound => "NOT_FOUND",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::InvalidHierarchy => "INVALID_HIERARCHY",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::IoError => "IO_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by discovery, caching, loading and migration.
#[derive(thiserror::Error, Debug)]
pub enum ContextFileError {
    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when accessing a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A hierarchy entry failed validation.
    #[error("Invalid hierarchy entry '{entry}': {reason}")]
    InvalidHierarchy {
        /// The offending entry
        entry: String,
        /// Why it was rejected
        reason: String,
    },

    /// A setting is out of range or could not be parsed.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// An I/O error occurred while accessing a path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ContextFileError {
    /// Stable code for programmatic handling.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotADirectory(_) => ErrorCode::NotADirectory,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::InvalidHierarchy { .. } => ErrorCode::InvalidHierarchy,
            Self::Configuration(_) => ErrorCode::ConfigurationError,
            Self::Io { .. } => ErrorCode::IoError,
        }
    }

    /// Whether this is the permission-error subtype.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// Whether this is the configuration-error subtype.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidHierarchy { .. } | Self::Configuration(_))
    }

    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let path = path.into();
        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}

/// Exit codes for the yelm-context binary.
///
/// - 0: Success (context files found / migration completed)
/// - 1: General error (unexpected failure)
/// - 2: No context files found
/// - 3: Partial success (some migrations failed or were blocked)
/// - 4: Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed and produced results.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Nothing found: discovery completed but no context file exists.
    NoContextFiles = 2,
    /// Partial success: completed, but some items failed.
    PartialSuccess = 3,
    /// Configuration could not be loaded or validated.
    ConfigError = 4,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "YC000",
            Self::GeneralError => "YC001",
            Self::NoContextFiles => "YC002",
            Self::PartialSuccess => "YC003",
            Self::ConfigError => "YC004",
        }
    }

    /// Pick the exit code for an error bubbling out of the application.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ContextFileError>() {
            Some(e) if e.is_configuration_error() => Self::ConfigError,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The exit code prefix (e.g., "YC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Library error code, when the failure came from the library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            error_code: err.downcast_ref::<ContextFileError>().map(|e| e.code()),
        }
    }
}
