//! Output formatters for command results.
//!
//! - [`text`] for terminals
//! - [`json`] for scripting

pub mod json;
pub mod text;

pub use json::{JsonLoad, JsonMigration, JsonOutput, JsonScanSummary};
