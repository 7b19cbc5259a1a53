//! The hierarchy resolver: global, upward, downward and extension steps.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::Level;

use super::{
    upward_stop, DiscoveredFile, DiscoveryRequest, DiscoverySource, Resolution, EXTENSION_LEVEL,
    GLOBAL_LEVEL,
};
use crate::cache::DiscoveryCache;
use crate::config::Config;
use crate::error::{ContextFileError, Result};
use crate::patterns::{PatternRegistry, LOWEST_PRIORITY};
use crate::scanner::path_utils::{directory_key, file_name_string};
use crate::scanner::{build_file_index, find_context_files, DirectoryScanner};

/// Resolves the ordered list of winning context files for a directory.
///
/// Stateless apart from the optional shared cache, so one resolver can
/// serve concurrent calls.
#[derive(Debug, Clone)]
pub struct HierarchyResolver {
    config: Arc<Config>,
    registry: PatternRegistry,
    cache: Option<Arc<DiscoveryCache>>,
}

/// Directories already holding a winner, by identity key.
type Claimed = HashSet<PathBuf>;

impl HierarchyResolver {
    /// Create a resolver; fails if the configuration is invalid.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        config.validate()?;
        let registry = PatternRegistry::new(&config.hierarchy)?;
        Ok(Self {
            config,
            registry,
            cache: None,
        })
    }

    /// Consult and fill `cache` on every discovery.
    #[must_use]
    pub fn with_cache(mut self, cache: Option<Arc<DiscoveryCache>>) -> Self {
        self.cache = cache;
        self
    }

    /// The pattern table in use.
    #[must_use]
    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The attached cache, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&Arc<DiscoveryCache>> {
        self.cache.as_ref()
    }

    /// Discover winning files for `request`, consulting the cache.
    ///
    /// The cache is keyed by the working directory alone. A result cached
    /// under one `ignore_oracle` is returned for a later request with a
    /// different oracle, so callers that vary the oracle per call should
    /// use a resolver without a cache (or one cache per oracle). Extension
    /// files are never cached and are applied on every call.
    ///
    /// # Errors
    ///
    /// Fails only when the working directory is missing or not a directory.
    /// Everything else degrades to fewer files.
    pub fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveredFile>> {
        let working_dir = resolve_working_dir(&request.working_dir)?;
        let key = directory_key(&working_dir);

        let cached = self.cache.as_ref().and_then(|cache| cache.get(&key));
        let mut files = match cached {
            Some(files) => {
                log::debug!("Discovery cache hit for {}", working_dir.display());
                files
            }
            None => {
                let resolution = self.resolve(&working_dir, request);
                let files = resolution.files.clone();
                if let Some(cache) = &self.cache {
                    cache.put(&key, resolution);
                }
                files
            }
        };

        self.append_extensions(&mut files, &request.extension_files);
        Ok(files)
    }

    /// Run steps 1–3 without the cache.
    ///
    /// `working_dir` must already be an existing directory.
    #[must_use]
    pub fn resolve(&self, working_dir: &Path, request: &DiscoveryRequest) -> Resolution {
        let level = if request.debug {
            Level::Info
        } else {
            Level::Debug
        };
        let mut resolution = Resolution::default();
        let mut claimed = Claimed::new();
        let global_keys: HashSet<PathBuf> = self
            .config
            .global_dir_paths()
            .iter()
            .map(|p| directory_key(p))
            .collect();

        let global = self.discover_global(&mut resolution, &mut claimed);
        log::log!(level, "Global step: {} file(s)", global.len());

        let upward = self.discover_upward(working_dir, &global_keys, &mut resolution, &mut claimed);
        log::log!(level, "Upward step: {} file(s)", upward.len());

        let downward = match self.discover_downward(
            working_dir,
            request,
            &global_keys,
            &mut resolution,
            &mut claimed,
        ) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("Downward scan of {} failed: {}", working_dir.display(), e);
                Vec::new()
            }
        };
        log::log!(level, "Downward step: {} file(s)", downward.len());

        resolution.files = global.into_iter().chain(upward).chain(downward).collect();
        resolution
    }

    /// Step 1: the first global directory that holds any pattern.
    fn discover_global(&self, resolution: &mut Resolution, claimed: &mut Claimed) -> Vec<DiscoveredFile> {
        let Some(home) = self.config.home_dir() else {
            log::debug!("No home directory; skipping global context");
            return Vec::new();
        };
        // Creating a global directory changes the home directory's mtime.
        resolution.track(&home);

        for dir in self.config.global_dir_paths() {
            if !dir.is_dir() {
                continue;
            }
            self.track_with_subdirs(resolution, &dir);

            if let Some((entry, path)) = self.registry.best_in_directory(&dir) {
                claimed.insert(directory_key(&dir));
                log::debug!("Global context file: {}", path.display());
                return vec![DiscoveredFile::new(
                    path,
                    dir,
                    entry.name.clone(),
                    entry.priority,
                    GLOBAL_LEVEL,
                    DiscoverySource::Global,
                )];
            }
        }
        Vec::new()
    }

    /// Step 2: the working directory and its ancestors up to the boundary,
    /// returned boundary-first.
    fn discover_upward(
        &self,
        working_dir: &Path,
        global_keys: &HashSet<PathBuf>,
        resolution: &mut Resolution,
        claimed: &mut Claimed,
    ) -> Vec<DiscoveredFile> {
        let home = self.config.home_dir().map(|h| resolve_dir(&h));
        let stop = upward_stop(working_dir, &self.config.project_markers, home.as_deref());

        let mut found = Vec::new();
        let mut level = 0;
        for dir in working_dir.ancestors() {
            let key = directory_key(dir);
            if global_keys.contains(&key) {
                log::debug!("Skipping global directory during upward walk: {}", dir.display());
            } else if !claimed.contains(&key) {
                self.track_with_subdirs(resolution, dir);
                if let Some((entry, path)) = self.registry.best_in_directory(dir) {
                    claimed.insert(key);
                    found.push(DiscoveredFile::new(
                        path,
                        dir.to_path_buf(),
                        entry.name.clone(),
                        entry.priority,
                        level,
                        DiscoverySource::Upward,
                    ));
                }
            }

            if dir == stop {
                break;
            }
            level += 1;
        }

        found.reverse();
        found
    }

    /// Step 3: one winner per descendant directory from a bounded scan.
    ///
    /// Global directories and everything below them are left to step 1,
    /// which is the case when the working directory is the home directory.
    fn discover_downward(
        &self,
        working_dir: &Path,
        request: &DiscoveryRequest,
        global_keys: &HashSet<PathBuf>,
        resolution: &mut Resolution,
        claimed: &mut Claimed,
    ) -> Result<Vec<DiscoveredFile>> {
        let scan = DirectoryScanner::new(working_dir, self.config.scan_options())
            .with_ignore_oracle(request.ignore_oracle.clone())
            .scan()?;

        for dir in &scan.directories {
            if let Some(modified) = dir.modified {
                resolution
                    .directory_mod_times
                    .insert(dir.path.clone(), modified);
            }
        }

        let index = build_file_index(&scan);
        let mut winners: Vec<_> = find_context_files(&index, &self.registry)
            .into_values()
            .collect();
        winners.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.directory.cmp(&b.directory)));

        let mut found = Vec::new();
        for winner in winners {
            let key = directory_key(&winner.directory);
            if global_keys.iter().any(|g| key.starts_with(g)) {
                log::debug!(
                    "Skipping global directory during downward scan: {}",
                    winner.directory.display()
                );
                continue;
            }
            if !claimed.insert(key) {
                continue;
            }
            found.push(DiscoveredFile::new(
                winner.file.path,
                winner.directory,
                winner.pattern_name,
                winner.priority,
                i32::try_from(winner.depth).unwrap_or(i32::MAX - 1),
                DiscoverySource::Downward,
            ));
        }
        Ok(found)
    }

    /// Step 4: append caller-supplied files that exist and whose directory
    /// has no winner yet.
    pub fn append_extensions(&self, files: &mut Vec<DiscoveredFile>, extension_files: &[PathBuf]) {
        let mut claimed: Claimed = files.iter().map(|f| directory_key(&f.directory)).collect();

        for path in extension_files {
            if !path.is_file() {
                log::warn!("Extension context file not found, skipping: {}", path.display());
                continue;
            }
            let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
            if !claimed.insert(directory_key(&directory)) {
                log::debug!(
                    "Extension context file {} skipped: its directory already has a winner",
                    path.display()
                );
                continue;
            }
            files.push(DiscoveredFile::new(
                path.clone(),
                directory,
                file_name_string(path),
                LOWEST_PRIORITY,
                EXTENSION_LEVEL,
                DiscoverySource::Extension,
            ));
        }
    }

    /// Track `dir` and the subdirectories nested patterns read from.
    fn track_with_subdirs(&self, resolution: &mut Resolution, dir: &Path) {
        resolution.track(dir);
        for subdir in self.registry.nested_subdirs() {
            resolution.track(&dir.join(subdir));
        }
    }
}

/// Canonical form of a directory, falling back to a cleaned absolute path.
fn resolve_dir(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        crate::scanner::path_utils::clean_path(&absolute)
    })
}

/// Validate and canonicalize the working directory.
fn resolve_working_dir(path: &Path) -> Result<PathBuf> {
    let metadata = std::fs::metadata(path).map_err(|e| ContextFileError::from_io(path, e))?;
    if !metadata.is_dir() {
        return Err(ContextFileError::NotADirectory(path.to_path_buf()));
    }
    Ok(resolve_dir(path))
}
