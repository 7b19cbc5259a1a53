//! Applying a migration plan to the filesystem.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    FailedMigration, MigrateError, MigratedFile, MigrationAction, MigrationCandidate,
    MigrationPlan, MigrationResult,
};
use crate::scanner::path_utils::clean_path;

/// Execute every candidate of `plan`, recording each outcome separately.
pub(crate) fn execute_migration(plan: &MigrationPlan, force: bool) -> MigrationResult {
    let mut result = MigrationResult::default();

    if !plan.conflicts.is_empty() && !force {
        let error = MigrateError::Blocked(plan.conflicts.len()).to_string();
        log::warn!("{}", error);
        result.failed = plan
            .candidates
            .iter()
            .map(|c| FailedMigration {
                file: c.current_path.clone(),
                error: error.clone(),
            })
            .collect();
        return finish(result);
    }

    let mut written: HashSet<PathBuf> = HashSet::new();
    for candidate in &plan.candidates {
        match migrate_one(candidate, force, &mut written) {
            Ok(()) => {
                log::info!(
                    "Migrated {} -> {}",
                    candidate.current_path.display(),
                    candidate.suggested_path.display()
                );
                result.migrated.push(MigratedFile {
                    from: candidate.current_path.clone(),
                    to: candidate.suggested_path.clone(),
                    action: candidate.action,
                });
            }
            Err(e) => {
                let error = e.to_string();
                log::warn!("Failed to migrate {}: {}", candidate.current_path.display(), error);
                result.failed.push(FailedMigration {
                    file: candidate.current_path.clone(),
                    error,
                });
            }
        }
    }

    finish(result)
}

fn finish(mut result: MigrationResult) -> MigrationResult {
    result.success = result.failed.is_empty();
    result.summary = if result.failed.is_empty() {
        format!("Migrated {} file(s)", result.migrated.len())
    } else {
        format!(
            "Migrated {} file(s), {} failed",
            result.migrated.len(),
            result.failed.len()
        )
    };
    log::info!("{}", result.summary);
    result
}

fn migrate_one(
    candidate: &MigrationCandidate,
    force: bool,
    written: &mut HashSet<PathBuf>,
) -> Result<(), MigrateError> {
    let source = &candidate.current_path;
    let target = &candidate.suggested_path;

    if !source.is_file() {
        return Err(MigrateError::SourceMissing(source.clone()));
    }
    let target_key = clean_path(target);
    if written.contains(&target_key) {
        return Err(MigrateError::TargetTaken(target.clone()));
    }
    if target.exists() {
        if !force {
            return Err(MigrateError::TargetExists(target.clone()));
        }
        fs::remove_file(target).map_err(|e| io_error("remove existing target", target, e))?;
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create directory", parent, e))?;
    }

    match candidate.action {
        MigrationAction::Copy => {
            fs::copy(source, target).map_err(|e| io_error("copy", source, e))?;
        }
        MigrationAction::Rename | MigrationAction::Move => move_file(source, target)?,
    }

    written.insert(target_key);
    Ok(())
}

/// Rename, falling back to copy and remove when the target is on another
/// filesystem.
fn move_file(source: &Path, target: &Path) -> Result<(), MigrateError> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            log::debug!(
                "Rename of {} failed ({}); trying copy and remove",
                source.display(),
                rename_err
            );
            fs::copy(source, target).map_err(|_| io_error("rename", source, rename_err))?;
            fs::remove_file(source).map_err(|e| io_error("remove original", source, e))
        }
    }
}

fn io_error(action: &'static str, path: &Path, source: std::io::Error) -> MigrateError {
    MigrateError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}
