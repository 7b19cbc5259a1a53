//! Pattern registry: the priority-ordered table of context filenames.
//!
//! Most patterns are flat filenames looked up directly inside a directory.
//! The editor rules file is the exception: it lives one level down, at
//! `<dir>/.cursor/rules`, and still belongs to `<dir>`. That distinction is
//! carried by [`PatternKind`] so path resolution is a total match.
//!
//! Lower priority numbers win.

use std::path::{Component, Path, PathBuf};

use crate::error::{ContextFileError, Result};

/// Priority assigned to unknown patterns and extension-supplied files.
pub const LOWEST_PRIORITY: u32 = u32::MAX;

/// Nested patterns known to the registry, as `(name, subdir, file)`.
const NESTED_PATTERNS: &[(&str, &str, &str)] = &[(".cursor/rules", ".cursor", "rules")];

/// Default hierarchy, highest priority first.
pub const DEFAULT_HIERARCHY: &[&str] = &["agents.md", "CLAUDE.md", "GEMINI.md", ".cursor/rules"];

/// How a pattern maps onto the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// A plain file directly inside the directory.
    Flat(String),
    /// A file inside a fixed subdirectory of the directory.
    Nested {
        /// Subdirectory name (e.g. `.cursor`)
        subdir: String,
        /// Filename inside the subdirectory (e.g. `rules`)
        file: String,
    },
}

impl PatternKind {
    /// Classify a hierarchy entry, consulting the nested-pattern table.
    #[must_use]
    pub fn classify(name: &str) -> Self {
        NESTED_PATTERNS
            .iter()
            .find(|(nested, _, _)| *nested == name)
            .map_or_else(
                || Self::Flat(name.to_string()),
                |(_, subdir, file)| Self::Nested {
                    subdir: (*subdir).to_string(),
                    file: (*file).to_string(),
                },
            )
    }

    /// The on-disk location of this pattern for `directory`.
    #[must_use]
    pub fn resolve(&self, directory: &Path) -> PathBuf {
        match self {
            Self::Flat(name) => directory.join(name),
            Self::Nested { subdir, file } => directory.join(subdir).join(file),
        }
    }

    /// The basename a matching file carries on disk.
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::Flat(name) => name,
            Self::Nested { file, .. } => file,
        }
    }
}

/// One row of the hierarchy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEntry {
    /// Hierarchy entry as configured (e.g. `CLAUDE.md`, `.cursor/rules`).
    pub name: String,
    /// Path-resolution rule.
    pub kind: PatternKind,
    /// Rank in the hierarchy; lower wins.
    pub priority: u32,
}

impl PatternEntry {
    /// Whether the pattern resolves below the directory it belongs to.
    #[must_use]
    pub fn has_special_path(&self) -> bool {
        matches!(self.kind, PatternKind::Nested { .. })
    }

    /// The on-disk location of this pattern for `directory`.
    #[must_use]
    pub fn resolve_path(&self, directory: &Path) -> PathBuf {
        self.kind.resolve(directory)
    }

    /// If a file called `file_name` inside `parent` is an instance of this
    /// pattern, return the directory that owns it.
    #[must_use]
    pub fn owner_of(&self, parent: &Path, file_name: &str) -> Option<PathBuf> {
        match &self.kind {
            PatternKind::Flat(name) => (name == file_name).then(|| parent.to_path_buf()),
            PatternKind::Nested { subdir, file } => {
                if file != file_name {
                    return None;
                }
                let parent_name = parent.file_name()?.to_str()?;
                if parent_name != subdir {
                    return None;
                }
                parent.parent().map(Path::to_path_buf)
            }
        }
    }
}

/// Validate a hierarchy list without building a registry.
///
/// Rejects empty entries, absolute paths, parent-directory traversal, path
/// separators outside registered nested patterns, and duplicates.
pub fn validate_hierarchy<S: AsRef<str>>(hierarchy: &[S]) -> Result<()> {
    if hierarchy.is_empty() {
        return Err(ContextFileError::Configuration(
            "hierarchy must contain at least one filename".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for entry in hierarchy {
        let entry = entry.as_ref();
        let reject = |reason: &str| ContextFileError::InvalidHierarchy {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        if entry.trim().is_empty() {
            return Err(reject("empty filename"));
        }
        let path = Path::new(entry);
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(reject("parent-directory traversal is not allowed"));
        }
        if path.has_root() || (cfg!(windows) && entry.contains(':')) {
            return Err(reject("absolute paths are not allowed"));
        }
        let has_separator = entry.contains('/') || entry.contains('\\');
        if has_separator && !NESTED_PATTERNS.iter().any(|(name, _, _)| *name == entry) {
            return Err(reject("path separators are only allowed in registered nested patterns"));
        }
        if !seen.insert(entry) {
            return Err(reject("duplicate entry"));
        }
    }
    Ok(())
}

/// The validated, priority-ordered hierarchy.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    entries: Vec<PatternEntry>,
}

impl PatternRegistry {
    /// Build a registry from a hierarchy list; index order is priority.
    pub fn new<S: AsRef<str>>(hierarchy: &[S]) -> Result<Self> {
        validate_hierarchy(hierarchy)?;
        let entries = hierarchy
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let name = name.as_ref();
                PatternEntry {
                    name: name.to_string(),
                    kind: PatternKind::classify(name),
                    priority: u32::try_from(index).unwrap_or(LOWEST_PRIORITY - 1),
                }
            })
            .collect();
        Ok(Self { entries })
    }

    /// Entries in priority order.
    #[must_use]
    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    /// Look up an entry by its hierarchy name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PatternEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// The highest-priority entry.
    #[must_use]
    pub fn preferred(&self) -> &PatternEntry {
        // `new` rejects empty hierarchies
        &self.entries[0]
    }

    /// Priority of a pattern name; unknown names rank lowest.
    #[must_use]
    pub fn priority_of(&self, name: &str) -> u32 {
        self.get(name).map_or(LOWEST_PRIORITY, |e| e.priority)
    }

    /// Resolve a pattern name for `directory`.
    ///
    /// Unknown names are treated as flat files.
    #[must_use]
    pub fn resolve_path(&self, name: &str, directory: &Path) -> PathBuf {
        match self.get(name) {
            Some(entry) => entry.resolve_path(directory),
            None => PatternKind::Flat(name.to_string()).resolve(directory),
        }
    }

    /// Attribute a physical file to the best matching pattern.
    ///
    /// Returns the entry and the directory the file belongs to.
    #[must_use]
    pub fn match_file(&self, parent: &Path, file_name: &str) -> Option<(&PatternEntry, PathBuf)> {
        self.entries
            .iter()
            .find_map(|entry| entry.owner_of(parent, file_name).map(|owner| (entry, owner)))
    }

    /// Check `directory` alone (not recursively) for the best present pattern.
    #[must_use]
    pub fn best_in_directory(&self, directory: &Path) -> Option<(&PatternEntry, PathBuf)> {
        self.entries.iter().find_map(|entry| {
            let candidate = entry.resolve_path(directory);
            candidate.is_file().then_some((entry, candidate))
        })
    }

    /// Subdirectories that nested patterns read from, for mtime tracking.
    pub fn nested_subdirs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match &e.kind {
            PatternKind::Nested { subdir, .. } => Some(subdir.as_str()),
            PatternKind::Flat(_) => None,
        })
    }
}
