//! Discovery caching module.
//!
//! Stores discovery results per working directory so repeated loads skip
//! the filesystem walk.
//!
//! # Architecture
//!
//! * [`store`]: the shared, mutex-guarded LRU map and its metrics.
//! * [`entry`]: the stored data and its validation logic.
//!
//! # Cache Invalidation
//!
//! An entry records the modification time of every directory whose
//! listing could change the result. It is served only if:
//! * it is younger than the configured maximum age, and
//! * every recorded directory still reports the recorded mtime.
//!
//! One changed (or vanished) directory invalidates the whole entry and the
//! next lookup rescans.

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::{CacheMetrics, DiscoveryCache};
