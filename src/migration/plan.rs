//! Target selection and conflict detection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{
    ConflictReason, LegacyFile, LegacyKind, MigrationAction, MigrationCandidate,
    MigrationConflict, MigrationPlan, MigrationService,
};
use crate::config::Config;
use crate::patterns::PatternRegistry;
use crate::scanner::path_utils::{directory_key, file_name_string, is_within};

/// Build a plan: one target per legacy file, plus every conflict.
pub(crate) fn suggest_migration(
    config: &Config,
    registry: &PatternRegistry,
    files: &[LegacyFile],
) -> MigrationPlan {
    let mut plan = MigrationPlan::default();
    let preferred = registry.preferred().name.clone();
    let legacy_globals = MigrationService::deprecated_global_paths(config);
    let current_global = config
        .home_dir()
        .map(|home| home.join(MigrationService::current_global_dir_name(config)));

    for file in files {
        let name = file_name_string(&file.path);
        let renamed = if MigrationService::is_deprecated_name(config, &name) {
            preferred.clone()
        } else {
            name.clone()
        };

        let target = match file.kind {
            LegacyKind::DeprecatedName => file.path.parent().map(|dir| dir.join(&renamed)),
            LegacyKind::DeprecatedGlobalDir => current_global.as_ref().and_then(|current| {
                global_target(&file.path, &legacy_globals, current, &renamed)
            }),
        };
        let Some(suggested_path) = target else {
            plan.warnings
                .push(format!("No migration target for {}", file.path.display()));
            continue;
        };
        if suggested_path == file.path {
            plan.warnings.push(format!(
                "{} already uses the preferred name",
                file.path.display()
            ));
            continue;
        }

        let action = if config.migration.keep_originals {
            MigrationAction::Copy
        } else if suggested_path.parent() == file.path.parent() {
            MigrationAction::Rename
        } else {
            MigrationAction::Move
        };

        plan.candidates.push(MigrationCandidate {
            current_path: file.path.clone(),
            suggested_path,
            action,
            priority: registry.priority_of(&name),
            kind: file.kind,
        });
    }

    find_conflicts(&mut plan);
    log::debug!(
        "Migration plan: {} candidate(s), {} conflict(s)",
        plan.candidates.len(),
        plan.conflicts.len()
    );
    plan
}

/// Map a file inside a deprecated global directory into `current`,
/// keeping its path below the global directory.
fn global_target(
    path: &Path,
    legacy_globals: &[PathBuf],
    current: &Path,
    renamed: &str,
) -> Option<PathBuf> {
    let legacy = legacy_globals.iter().find(|g| is_within(path, g))?;
    let legacy_key = directory_key(legacy);
    let relative = directory_key(path)
        .strip_prefix(&legacy_key)
        .ok()?
        .to_path_buf();
    let target = current.join(relative);
    Some(match target.parent() {
        Some(parent) => parent.join(renamed),
        None => target,
    })
}

/// Record collisions between candidates and targets that already exist.
fn find_conflicts(plan: &mut MigrationPlan) {
    let mut by_target: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for candidate in &plan.candidates {
        by_target
            .entry(directory_key(&candidate.suggested_path))
            .or_default()
            .push(candidate.current_path.clone());
    }

    for candidate in &plan.candidates {
        let key = directory_key(&candidate.suggested_path);
        let Some(sources) = by_target.get(&key) else {
            continue;
        };

        if sources.len() > 1 {
            if !plan
                .conflicts
                .iter()
                .any(|c| c.reason == ConflictReason::Collision && directory_key(&c.target) == key)
            {
                plan.warnings.push(format!(
                    "{} files would migrate to {}: {}",
                    sources.len(),
                    candidate.suggested_path.display(),
                    sources
                        .iter()
                        .map(|s| s.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
                plan.conflicts.push(MigrationConflict {
                    target: candidate.suggested_path.clone(),
                    sources: sources.clone(),
                    reason: ConflictReason::Collision,
                });
            }
        }

        if candidate.suggested_path.exists() {
            plan.warnings.push(format!(
                "Target already exists: {}",
                candidate.suggested_path.display()
            ));
            plan.conflicts.push(MigrationConflict {
                target: candidate.suggested_path.clone(),
                sources: vec![candidate.current_path.clone()],
                reason: ConflictReason::TargetExists,
            });
        }
    }
}
