//! Human-readable output for command results.
//!
//! Colors come from `yansi`; the binary turns them off for `--no-color`,
//! `NO_COLOR` and non-terminal stdout.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use crate::cache::CacheMetrics;
use crate::discovery::{DiscoveredFile, DiscoverySource};
use crate::manager::LoadedContext;
use crate::migration::{ConflictReason, MigrationAction, MigrationPlan, MigrationResult};
use crate::scanner::ScanResult;

fn source_label(source: DiscoverySource) -> &'static str {
    match source {
        DiscoverySource::Global => "global",
        DiscoverySource::Upward => "upward",
        DiscoverySource::Downward => "downward",
        DiscoverySource::Extension => "extension",
    }
}

fn action_label(action: MigrationAction) -> &'static str {
    match action {
        MigrationAction::Rename => "rename",
        MigrationAction::Move => "move",
        MigrationAction::Copy => "copy",
    }
}

/// Write the combined context, or nothing when no file was found.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_context<W: Write>(writer: &mut W, context: &LoadedContext) -> io::Result<()> {
    if context.content.is_empty() {
        return Ok(());
    }
    writeln!(writer, "{}", context.content)
}

/// Write one line per discovered file.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_file_list<W: Write>(writer: &mut W, files: &[DiscoveredFile]) -> io::Result<()> {
    if files.is_empty() {
        return writeln!(writer, "{}", "No context files found".yellow());
    }
    for file in files {
        let level = if file.source == DiscoverySource::Extension {
            "-".to_string()
        } else {
            file.directory_level.to_string()
        };
        writeln!(
            writer,
            "{:>9} {:>3}  {}",
            source_label(file.source).dim(),
            level,
            file.absolute_path.display().bold()
        )?;
    }
    Ok(())
}

/// Write cache counters on one line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_cache_metrics<W: Write>(writer: &mut W, metrics: &CacheMetrics) -> io::Result<()> {
    writeln!(
        writer,
        "cache: {} hit(s), {} miss(es), {} eviction(s), {:.0}% hit rate, {} entr{}",
        metrics.hits,
        metrics.misses,
        metrics.evictions,
        metrics.hit_rate * 100.0,
        metrics.size,
        if metrics.size == 1 { "y" } else { "ies" }
    )
}

/// Write scanner statistics.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_scan<W: Write>(writer: &mut W, result: &ScanResult) -> io::Result<()> {
    writeln!(writer, "{} {}", "Scanned".bold(), result.root.display())?;
    writeln!(writer, "  directories: {}", result.directories_scanned)?;
    writeln!(
        writer,
        "  files:       {} ({})",
        result.files.len(),
        ByteSize::b(result.total_size())
    )?;
    if result.unreadable_dirs > 0 {
        writeln!(
            writer,
            "  unreadable:  {}",
            result.unreadable_dirs.to_string().yellow()
        )?;
    }
    writeln!(writer, "  duration:    {} ms", result.duration_ms)?;
    if result.limit_reached {
        writeln!(
            writer,
            "{}",
            "Directory limit reached; results are partial".yellow()
        )?;
    }
    Ok(())
}

/// Write a migration plan and, if given, its execution result.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_migration<W: Write>(
    writer: &mut W,
    plan: &MigrationPlan,
    result: Option<&MigrationResult>,
) -> io::Result<()> {
    if plan.is_empty() {
        writeln!(writer, "{}", "No legacy context files found".green())?;
    }

    for candidate in &plan.candidates {
        writeln!(
            writer,
            "{:>6}  {} -> {}",
            action_label(candidate.action).cyan(),
            candidate.current_path.display(),
            candidate.suggested_path.display().bold()
        )?;
    }

    for conflict in &plan.conflicts {
        let reason = match conflict.reason {
            ConflictReason::Collision => "collision",
            ConflictReason::TargetExists => "target exists",
        };
        writeln!(
            writer,
            "{} {}: {}",
            "conflict".red().bold(),
            reason,
            conflict.target.display()
        )?;
        for source in &conflict.sources {
            writeln!(writer, "    from {}", source.display())?;
        }
    }

    for warning in &plan.warnings {
        writeln!(writer, "{} {}", "note".yellow(), warning)?;
    }

    if let Some(result) = result {
        for failed in &result.failed {
            writeln!(
                writer,
                "{} {}: {}",
                "failed".red(),
                failed.file.display(),
                failed.error
            )?;
        }
        let summary = if result.success {
            result.summary.green()
        } else {
            result.summary.red()
        };
        writeln!(writer, "{summary}")?;
    } else if !plan.is_empty() {
        writeln!(writer, "Run with --execute to apply this plan")?;
    }
    Ok(())
}
