//! Bounded walk for legacy files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{DetectOptions, LegacyFile, LegacyKind, MigrationService};
use crate::config::Config;
use crate::patterns::PatternRegistry;
use crate::scanner::path_utils::is_within;
use crate::scanner::NameMatcher;

/// Flag files with deprecated names under `working_dir`, plus hierarchy
/// files inside deprecated global directories when requested.
///
/// Unreadable entries are skipped with a debug log. Results are sorted by
/// path and contain each file once.
pub(crate) fn detect_legacy_files(
    config: &Config,
    registry: &PatternRegistry,
    working_dir: &Path,
    options: &DetectOptions,
) -> Vec<LegacyFile> {
    let legacy_globals = MigrationService::deprecated_global_paths(config);
    let ignore = NameMatcher::lenient(&config.ignore_patterns);
    let mut found: BTreeMap<PathBuf, LegacyKind> = BTreeMap::new();
    let mut examined = 0usize;

    let walker = WalkDir::new(working_dir)
        .max_depth(options.max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !ignore.is_match(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry during legacy detection: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        examined += 1;
        if examined > options.max_files {
            log::warn!(
                "Legacy detection stopped after {} files under {}",
                options.max_files,
                working_dir.display()
            );
            break;
        }

        if !MigrationService::is_deprecated_name(config, &entry.file_name().to_string_lossy()) {
            continue;
        }
        let path = entry.into_path();
        let kind = if legacy_globals.iter().any(|g| is_within(&path, g)) {
            LegacyKind::DeprecatedGlobalDir
        } else {
            LegacyKind::DeprecatedName
        };
        found.insert(path, kind);
    }

    if options.include_global {
        for dir in legacy_globals.iter().filter(|d| d.is_dir()) {
            for entry in registry.entries() {
                let path = entry.resolve_path(dir);
                if path.is_file() {
                    found.insert(path, LegacyKind::DeprecatedGlobalDir);
                }
            }
        }
    }

    log::debug!(
        "Legacy detection under {} found {} file(s)",
        working_dir.display(),
        found.len()
    );

    found
        .into_iter()
        .map(|(path, kind)| LegacyFile { path, kind })
        .collect()
}
