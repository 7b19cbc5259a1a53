//! Cache entry definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use crate::discovery::DiscoveredFile;

/// A cached discovery result for one working directory.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Working directory identity key
    pub key: PathBuf,
    /// Files from the filesystem discovery steps
    pub results: Vec<DiscoveredFile>,
    /// Directory mtimes observed when the result was computed
    pub directory_mod_times: HashMap<PathBuf, SystemTime>,
    /// When the entry was stored
    pub created_at: Instant,
    /// When the entry was last served
    pub last_accessed_at: Instant,
}

impl CacheEntry {
    /// Create an entry stamped with `now`.
    #[must_use]
    pub fn new(
        key: PathBuf,
        results: Vec<DiscoveredFile>,
        directory_mod_times: HashMap<PathBuf, SystemTime>,
        now: Instant,
    ) -> Self {
        Self {
            key,
            results,
            directory_mod_times,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Whether the entry is at least `max_age` old.
    #[must_use]
    pub fn is_expired(&self, max_age: Duration, now: Instant) -> bool {
        let expired = now.saturating_duration_since(self.created_at) >= max_age;
        if expired {
            log::debug!("Cache entry for {} expired", self.key.display());
        }
        expired
    }
}

/// Whether every directory still reports its recorded mtime.
///
/// One `stat` per directory; a missing or unreadable directory counts as
/// changed.
#[must_use]
pub fn directories_unchanged(directory_mod_times: &HashMap<PathBuf, SystemTime>) -> bool {
    directory_mod_times.iter().all(|(dir, recorded)| {
        match std::fs::metadata(dir).and_then(|m| m.modified()) {
            Ok(current) if current == *recorded => true,
            Ok(_) => {
                log::debug!("Directory changed since caching: {}", dir.display());
                false
            }
            Err(e) => {
                log::debug!("Cannot revalidate {}: {}", dir.display(), e);
                false
            }
        }
    })
}
