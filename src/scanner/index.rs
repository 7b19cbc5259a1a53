//! In-memory index over a scan and per-directory winner selection.
//!
//! [`build_file_index`] makes one pass over the flat file list and fills
//! three lookup maps (by name, by directory, by depth). With those,
//! [`find_context_files`] answers "what is the best context file in each
//! directory" by probing the name map once per pattern, instead of
//! re-walking the tree.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::{FileIndexEntry, ScanResult};
use crate::patterns::PatternRegistry;

/// Lookup maps over the files of one scan. Values index into `files`.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    /// The scan root
    pub root: PathBuf,
    /// Flat file list, in traversal order
    pub files: Vec<FileIndexEntry>,
    /// Basename -> files
    pub by_name: HashMap<String, Vec<usize>>,
    /// Containing directory -> files
    pub by_directory: HashMap<PathBuf, Vec<usize>>,
    /// Depth -> files
    pub by_depth: BTreeMap<usize, Vec<usize>>,
}

impl FileIndex {
    /// Files with the given basename.
    pub fn named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a FileIndexEntry> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| &self.files[i])
    }

    /// Files directly inside `directory`.
    pub fn in_directory<'a>(
        &'a self,
        directory: &Path,
    ) -> impl Iterator<Item = &'a FileIndexEntry> + 'a {
        self.by_directory
            .get(directory)
            .into_iter()
            .flatten()
            .map(|&i| &self.files[i])
    }

    /// Files at the given depth.
    pub fn at_depth(&self, depth: usize) -> impl Iterator<Item = &FileIndexEntry> + '_ {
        self.by_depth
            .get(&depth)
            .into_iter()
            .flatten()
            .map(|&i| &self.files[i])
    }

    /// Number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the index holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Build the lookup maps in a single pass.
#[must_use]
pub fn build_file_index(scan: &ScanResult) -> FileIndex {
    let mut index = FileIndex {
        root: scan.root.clone(),
        files: scan.files.clone(),
        ..FileIndex::default()
    };

    for (i, file) in index.files.iter().enumerate() {
        index.by_name.entry(file.name.clone()).or_default().push(i);
        index
            .by_directory
            .entry(file.directory.clone())
            .or_default()
            .push(i);
        index.by_depth.entry(file.depth).or_default().push(i);
    }

    index
}

/// The winning context file of one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMatch {
    /// The directory the file belongs to
    pub directory: PathBuf,
    /// The physical file
    pub file: FileIndexEntry,
    /// Hierarchy entry that matched
    pub pattern_name: String,
    /// Priority of that entry
    pub priority: u32,
    /// Depth of `directory` below the scan root
    pub depth: usize,
}

/// Pick one winner per directory: the file whose pattern has the lowest
/// priority number.
///
/// A nested pattern's file is attributed to the directory above its
/// subdirectory, so `<dir>/.cursor/rules` competes with `<dir>/agents.md`.
#[must_use]
pub fn find_context_files(
    index: &FileIndex,
    registry: &PatternRegistry,
) -> BTreeMap<PathBuf, ContextMatch> {
    let mut winners: BTreeMap<PathBuf, ContextMatch> = BTreeMap::new();

    for entry in registry.entries() {
        for file in index.named(entry.kind.file_name()) {
            let Some(owner) = entry.owner_of(&file.directory, &file.name) else {
                continue;
            };
            let depth = if entry.has_special_path() {
                file.depth.saturating_sub(1)
            } else {
                file.depth
            };

            // Entries are visited in priority order, so the first claim wins.
            winners.entry(owner.clone()).or_insert_with(|| ContextMatch {
                directory: owner,
                file: file.clone(),
                pattern_name: entry.name.clone(),
                priority: entry.priority,
                depth,
            });
        }
    }

    winners
}
