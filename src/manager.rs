//! Loading and concatenating discovered context files.
//!
//! The manager runs discovery (through the shared cache when one is
//! attached), reads each winning file and joins the contents in resolution
//! order, wrapping each file in provenance markers:
//!
//! ```text
//! --- Context from: src/agents.md ---
//! <trimmed file content>
//! --- End of Context from: src/agents.md ---
//! ```
//!
//! Files that cannot be read are dropped with a warning; the load itself
//! only fails when the working directory is invalid.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::cache::DiscoveryCache;
use crate::config::Config;
use crate::discovery::{DiscoveredFile, DiscoveryRequest, DiscoverySource, HierarchyResolver};
use crate::error::Result;
use crate::scanner::path_utils::relative_display;

/// Input to [`ContextFileManager::load_context_files`].
pub type LoadRequest = DiscoveryRequest;

/// Post-processing applied to each file's text before concatenation,
/// e.g. expanding `@import` lines.
pub trait ContentProcessor: Send + Sync {
    /// Return the processed content of the file at `path`.
    fn process(&self, content: &str, path: &Path) -> String;
}

/// Combined context for one working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadedContext {
    /// Concatenated content with provenance markers
    pub content: String,
    /// Number of files that made it into `content`
    pub file_count: usize,
    /// The files that made it into `content`, in order
    pub files: Vec<DiscoveredFile>,
    /// Distinct basenames of `files`, sorted
    pub file_names: Vec<String>,
}

impl LoadedContext {
    /// Whether no context was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }
}

/// Opening provenance marker.
#[must_use]
pub fn context_header(display_path: &str) -> String {
    format!("--- Context from: {display_path} ---")
}

/// Closing provenance marker.
#[must_use]
pub fn context_footer(display_path: &str) -> String {
    format!("--- End of Context from: {display_path} ---")
}

/// Discovers, reads and concatenates context files.
pub struct ContextFileManager {
    resolver: HierarchyResolver,
    processor: Option<Box<dyn ContentProcessor>>,
}

impl std::fmt::Debug for ContextFileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextFileManager")
            .field("resolver", &self.resolver)
            .field("has_processor", &self.processor.is_some())
            .finish()
    }
}

impl ContextFileManager {
    /// Create a manager without a cache.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the hierarchy or limits are invalid.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        Ok(Self {
            resolver: HierarchyResolver::new(config)?,
            processor: None,
        })
    }

    /// Share `cache` across loads.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DiscoveryCache>) -> Self {
        self.resolver = self.resolver.with_cache(Some(cache));
        self
    }

    /// Run `processor` over every file's content.
    #[must_use]
    pub fn with_processor(mut self, processor: Box<dyn ContentProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// The underlying resolver.
    #[must_use]
    pub fn resolver(&self) -> &HierarchyResolver {
        &self.resolver
    }

    /// Load the context for `working_dir` with no extensions or oracle.
    ///
    /// # Errors
    ///
    /// Fails if `working_dir` is missing or not a directory.
    pub fn load(&self, working_dir: impl Into<PathBuf>) -> Result<LoadedContext> {
        self.load_context_files(&LoadRequest::new(working_dir))
    }

    /// Discover and load the context for `request`.
    ///
    /// # Errors
    ///
    /// Fails if the working directory is missing or not a directory.
    pub fn load_context_files(&self, request: &LoadRequest) -> Result<LoadedContext> {
        let discovered = self.resolver.discover(request)?;
        let base = std::fs::canonicalize(&request.working_dir)
            .unwrap_or_else(|_| request.working_dir.clone());

        self.warn_deprecated(&discovered);

        let mut sections = Vec::with_capacity(discovered.len());
        let mut files = Vec::with_capacity(discovered.len());

        for file in discovered {
            if let Some(oracle) = &request.ignore_oracle {
                if oracle.should_ignore(&file.absolute_path, false) {
                    log::debug!("Ignoring context file at read time: {}", file.absolute_path.display());
                    continue;
                }
            }

            let raw = match std::fs::read(&file.absolute_path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        log::debug!(
                            "Context file {} is not valid UTF-8; replacing invalid bytes",
                            file.absolute_path.display()
                        );
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                },
                Err(e) => {
                    log::warn!(
                        "Could not read context file {}: {}",
                        file.absolute_path.display(),
                        e
                    );
                    continue;
                }
            };

            let content = match &self.processor {
                Some(processor) => processor.process(&raw, &file.absolute_path),
                None => raw,
            };

            let display = relative_display(&file.absolute_path, &base);
            sections.push(format!(
                "{}\n{}\n{}",
                context_header(&display),
                content.trim(),
                context_footer(&display)
            ));
            files.push(file);
        }

        let file_names: BTreeSet<String> = files.iter().map(DiscoveredFile::file_name).collect();

        log::debug!(
            "Loaded {} context file(s) for {}",
            files.len(),
            request.working_dir.display()
        );

        Ok(LoadedContext {
            content: sections.join("\n\n"),
            file_count: files.len(),
            files,
            file_names: file_names.into_iter().collect(),
        })
    }

    /// Log a rename suggestion for each file matched by a deprecated name.
    fn warn_deprecated(&self, files: &[DiscoveredFile]) {
        let config = self.resolver.config();
        let preferred = &self.resolver.registry().preferred().name;
        for file in files {
            if file.source == DiscoverySource::Extension || file.pattern_name == *preferred {
                continue;
            }
            let deprecated = config
                .migration
                .deprecated_patterns
                .iter()
                .any(|p| p.eq_ignore_ascii_case(&file.pattern_name));
            if deprecated {
                log::warn!(
                    "{} uses the deprecated name {}; rename suggested: {}",
                    file.absolute_path.display(),
                    file.pattern_name,
                    file.directory.join(preferred).display()
                );
            }
        }
    }
}
