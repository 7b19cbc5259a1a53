//! In-memory discovery cache with LRU eviction.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use lru::LruCache;
use serde::Serialize;

use super::entry::{directories_unchanged, CacheEntry};
use crate::config::Config;
use crate::discovery::{DiscoveredFile, Resolution};

/// Counters reported by [`DiscoveryCache::metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheMetrics {
    /// Lookups served from a valid entry
    pub hits: u64,
    /// Lookups that found nothing or a stale entry
    pub misses: u64,
    /// Entries dropped to make room
    pub evictions: u64,
    /// `hits / (hits + misses)`, or 0 before any lookup
    pub hit_rate: f64,
    /// Entries currently held
    pub size: usize,
}

/// A stored entry plus a stamp that changes on every `put`, so a lookup
/// that validated outside the lock can tell whether the entry was replaced
/// in the meantime.
struct Slot {
    generation: u64,
    entry: CacheEntry,
}

struct CacheState {
    entries: LruCache<PathBuf, Slot>,
    next_generation: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// What a lookup needs to revalidate an entry without holding the lock.
struct Snapshot {
    generation: u64,
    directory_mod_times: HashMap<PathBuf, SystemTime>,
}

/// Discovery results keyed by working directory.
///
/// Owned by the caller and shared by handle (`Arc<DiscoveryCache>`); the
/// map sits behind a mutex so threads may share it. Two simultaneous misses
/// for the same directory both rescan; discovery is idempotent so the last
/// `put` simply wins.
pub struct DiscoveryCache {
    max_age: Duration,
    state: Mutex<CacheState>,
}

impl std::fmt::Debug for DiscoveryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryCache")
            .field("max_age", &self.max_age)
            .field("metrics", &self.metrics())
            .finish()
    }
}

impl DiscoveryCache {
    /// Create a cache holding up to `max_size` directories (at least one).
    #[must_use]
    pub fn new(max_size: usize, max_age: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            max_age,
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                next_generation: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    /// Create a cache sized by the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_cache_size, config.max_cache_age())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached files for `key` if the entry is still valid.
    ///
    /// Directory mtimes are checked without holding the lock, so lookups
    /// for other directories are not held up by filesystem calls. A stale
    /// entry is removed and counted as a miss.
    pub fn get(&self, key: &Path) -> Option<Vec<DiscoveredFile>> {
        let snapshot = self.snapshot(key)?;
        let unchanged = directories_unchanged(&snapshot.directory_mod_times);
        self.commit(key, &snapshot, unchanged)
    }

    /// First half of a lookup: copy out what revalidation needs.
    ///
    /// Missing and expired entries are settled here as misses.
    fn snapshot(&self, key: &Path) -> Option<Snapshot> {
        let now = Instant::now();
        let mut state = self.lock();

        let found = state.entries.peek(key).map(|slot| {
            (!slot.entry.is_expired(self.max_age, now)).then(|| Snapshot {
                generation: slot.generation,
                directory_mod_times: slot.entry.directory_mod_times.clone(),
            })
        });

        match found {
            Some(Some(snapshot)) => Some(snapshot),
            Some(None) => {
                state.entries.pop(key);
                state.misses += 1;
                None
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Second half of a lookup: serve or drop the entry the snapshot came
    /// from. An entry replaced since the snapshot is left alone and the
    /// lookup counts as a miss.
    fn commit(&self, key: &Path, snapshot: &Snapshot, unchanged: bool) -> Option<Vec<DiscoveredFile>> {
        let mut state = self.lock();
        let same_entry = state
            .entries
            .peek(key)
            .is_some_and(|slot| slot.generation == snapshot.generation);

        if !same_entry {
            state.misses += 1;
            log::debug!("Cache entry for {} changed during revalidation", key.display());
            return None;
        }
        if !unchanged {
            state.entries.pop(key);
            state.misses += 1;
            log::debug!("Discarded stale cache entry for {}", key.display());
            return None;
        }

        let results = state.entries.get_mut(key).map(|slot| {
            slot.entry.last_accessed_at = Instant::now();
            slot.entry.results.clone()
        });
        state.hits += 1;
        results
    }

    /// Store a resolution for `key`, evicting the least recently used entry
    /// when full.
    pub fn put(&self, key: &Path, resolution: Resolution) {
        let entry = CacheEntry::new(
            key.to_path_buf(),
            resolution.files,
            resolution.directory_mod_times,
            Instant::now(),
        );
        let mut state = self.lock();
        let generation = state.next_generation;
        state.next_generation += 1;
        if let Some((evicted, _)) = state.entries.push(key.to_path_buf(), Slot { generation, entry }) {
            if evicted != key {
                state.evictions += 1;
                log::debug!("Evicted cache entry for {}", evicted.display());
            }
        }
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &Path) -> bool {
        self.lock().entries.pop(key).is_some()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        state.evictions = 0;
    }

    /// Number of cached directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters.
    #[must_use]
    pub fn metrics(&self) -> CacheMetrics {
        let state = self.lock();
        let lookups = state.hits + state.misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            state.hits as f64 / lookups as f64
        };
        CacheMetrics {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            hit_rate,
            size: state.entries.len(),
        }
    }
}
