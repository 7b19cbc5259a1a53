use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use filetime::{set_file_mtime, FileTime};
use yelm_context::cache::DiscoveryCache;
use yelm_context::discovery::{DiscoveryRequest, HierarchyResolver};
use yelm_context::manager::ContextFileManager;
use yelm_context::scanner::IgnoreOracle;

use super::fixtures::Fixture;

fn cached_resolver(fx: &Fixture, cache: &Arc<DiscoveryCache>) -> HierarchyResolver {
    HierarchyResolver::new(fx.shared_config())
        .unwrap()
        .with_cache(Some(Arc::clone(cache)))
}

/// Push a directory's mtime far into the past so the change is visible
/// regardless of filesystem timestamp granularity.
fn touch_dir(path: &std::path::Path) {
    set_file_mtime(path, FileTime::from_unix_time(1_000_000_000, 0)).unwrap();
}

#[test]
fn test_rescan_of_unchanged_tree_hits() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("agents.md"), "p");
    fx.write(&proj.join("sub").join("CLAUDE.md"), "s");

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let resolver = cached_resolver(&fx, &cache);
    let request = DiscoveryRequest::new(&proj);

    let first = resolver.discover(&request).unwrap();
    let second = resolver.discover(&request).unwrap();

    assert_eq!(first, second);
    let metrics = cache.metrics();
    assert_eq!(metrics.misses, 1);
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.size, 1);
}

#[test]
fn test_touching_contributing_dir_invalidates() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("sub").join("CLAUDE.md"), "s");

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let resolver = cached_resolver(&fx, &cache);
    let request = DiscoveryRequest::new(&proj);

    resolver.discover(&request).unwrap();
    touch_dir(&proj.join("sub"));
    resolver.discover(&request).unwrap();

    let metrics = cache.metrics();
    assert_eq!(metrics.misses, 2);
    assert_eq!(metrics.hits, 0);
}

#[test]
fn test_new_file_is_picked_up_after_invalidation() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fs::create_dir_all(proj.join("sub")).unwrap();

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let resolver = cached_resolver(&fx, &cache);
    let request = DiscoveryRequest::new(&proj);

    assert!(resolver.discover(&request).unwrap().is_empty());

    fx.write(&proj.join("sub").join("agents.md"), "new");
    touch_dir(&proj.join("sub"));

    let files = resolver.discover(&request).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].absolute_path, proj.join("sub").join("agents.md"));
}

#[test]
fn test_global_dir_change_invalidates() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    let global = fx.home.join(".yelm");
    fs::create_dir_all(&global).unwrap();

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let resolver = cached_resolver(&fx, &cache);
    let request = DiscoveryRequest::new(&proj);

    resolver.discover(&request).unwrap();
    fx.write(&global.join("agents.md"), "g");
    touch_dir(&global);

    let files = resolver.discover(&request).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(cache.metrics().hits, 0);
}

#[test]
fn test_extensions_are_not_cached() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("agents.md"), "p");
    let ext = fx.write(&fx.root.join("ext").join("EXTRA.md"), "e");

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let resolver = cached_resolver(&fx, &cache);

    let plain = resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();
    let extended = resolver
        .discover(&DiscoveryRequest::new(&proj).with_extension_files(vec![ext]))
        .unwrap();

    assert_eq!(plain.len(), 1);
    assert_eq!(extended.len(), 2);
    assert_eq!(cache.metrics().hits, 1);
}

struct SkipSub;

impl IgnoreOracle for SkipSub {
    fn should_ignore(&self, path: &std::path::Path, _is_dir: bool) -> bool {
        path.file_name().is_some_and(|n| n == "sub")
    }
}

#[test]
fn test_oracle_is_not_part_of_cache_key() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("sub").join("agents.md"), "s");

    let filtered = || DiscoveryRequest::new(&proj).with_ignore_oracle(Some(Arc::new(SkipSub)));

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let resolver = cached_resolver(&fx, &cache);
    assert_eq!(resolver.discover(&DiscoveryRequest::new(&proj)).unwrap().len(), 1);
    // Served from the entry cached without an oracle.
    assert_eq!(resolver.discover(&filtered()).unwrap().len(), 1);
    assert_eq!(cache.metrics().hits, 1);

    let uncached = HierarchyResolver::new(fx.shared_config()).unwrap();
    assert!(uncached.discover(&filtered()).unwrap().is_empty());
}

#[test]
fn test_expired_entry_misses() {
    let fx = Fixture::new();
    let proj = fx.project("proj");

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_millis(20)));
    let resolver = cached_resolver(&fx, &cache);
    let request = DiscoveryRequest::new(&proj);

    resolver.discover(&request).unwrap();
    thread::sleep(Duration::from_millis(50));
    resolver.discover(&request).unwrap();

    assert_eq!(cache.metrics().misses, 2);
}

#[test]
fn test_cache_shared_between_managers() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("agents.md"), "p");

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let a = ContextFileManager::new(fx.shared_config())
        .unwrap()
        .with_cache(Arc::clone(&cache));
    let b = ContextFileManager::new(fx.shared_config())
        .unwrap()
        .with_cache(Arc::clone(&cache));

    let first = a.load(&proj).unwrap();
    let second = b.load(&proj).unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.metrics().hits, 1);
}

#[test]
fn test_concurrent_loads_for_different_dirs() {
    let fx = Fixture::new();
    let dirs: Vec<_> = (0..4)
        .map(|i| {
            let proj = fx.project(&format!("proj{i}"));
            fx.write(&proj.join("agents.md"), &format!("project {i}"));
            proj
        })
        .collect();

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let manager = Arc::new(
        ContextFileManager::new(fx.shared_config())
            .unwrap()
            .with_cache(Arc::clone(&cache)),
    );

    let handles: Vec<_> = dirs
        .iter()
        .cloned()
        .map(|dir| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.load(&dir).unwrap())
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let loaded = handle.join().unwrap();
        assert_eq!(loaded.file_count, 1);
        assert!(loaded.content.contains(&format!("project {i}")));
    }
    assert_eq!(cache.len(), 4);
}

#[test]
fn test_clear_resets_metrics() {
    let fx = Fixture::new();
    let proj = fx.project("proj");

    let cache = Arc::new(DiscoveryCache::new(8, Duration::from_secs(60)));
    let resolver = cached_resolver(&fx, &cache);
    resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();

    cache.clear();
    let metrics = cache.metrics();
    assert_eq!(metrics.size, 0);
    assert_eq!(metrics.misses, 0);
    assert!(metrics.hit_rate.abs() < f64::EPSILON);
}
