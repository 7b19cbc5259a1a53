//! Command dispatch for the `yelm-context` binary.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cache::DiscoveryCache;
use crate::cli::{Cli, Commands, LoadArgs, MigrateArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::discovery::{find_project_root, DiscoveryRequest};
use crate::error::ExitCode;
use crate::logging::init_logging;
use crate::manager::ContextFileManager;
use crate::migration::{DetectOptions, MigrationService};
use crate::output::{text, JsonLoad, JsonMigration, JsonOutput, JsonScanSummary};
use crate::scanner::{DirectoryScanner, GitignoreOracle, IgnoreOracle};

/// Run the parsed command line and return the process exit code.
///
/// # Errors
///
/// Returns an error if configuration loading fails, the target path is not
/// a directory, or writing output fails.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Load(args) => run_load(config, args, &mut out),
        Commands::Scan(args) => run_scan(&config, args, &mut out),
        Commands::Migrate(args) => run_migrate(config, args, &mut out),
    }
}

fn target_dir(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Gitignore rules of the project containing `working_dir`.
fn project_oracle(working_dir: &Path, config: &Config) -> Option<Arc<dyn IgnoreOracle>> {
    let working_dir = std::fs::canonicalize(working_dir).ok()?;
    let root = find_project_root(&working_dir, &config.project_markers).unwrap_or(working_dir);
    GitignoreOracle::from_root(&root, &[]).map(|oracle| Arc::new(oracle) as Arc<dyn IgnoreOracle>)
}

fn run_load<W: Write>(config: Config, args: LoadArgs, out: &mut W) -> Result<ExitCode> {
    let working_dir = target_dir(args.path)?;
    let oracle = if args.no_gitignore {
        None
    } else {
        project_oracle(&working_dir, &config)
    };
    let use_cache = config.cache_enabled && !args.no_cache;
    let cache = use_cache.then(|| Arc::new(DiscoveryCache::from_config(&config)));

    let mut manager = ContextFileManager::new(Arc::new(config))?;
    if let Some(cache) = &cache {
        manager = manager.with_cache(Arc::clone(cache));
    }

    let request = DiscoveryRequest::new(&working_dir)
        .with_extension_files(args.extension_files)
        .with_ignore_oracle(oracle)
        .with_debug(args.debug);
    let context = manager
        .load_context_files(&request)
        .with_context(|| format!("Failed to load context for {}", working_dir.display()))?;

    let exit_code = if context.is_empty() {
        ExitCode::NoContextFiles
    } else {
        ExitCode::Success
    };
    let metrics = cache.as_ref().map(|c| c.metrics());
    if let Some(metrics) = &metrics {
        log::debug!("Cache metrics: {:?}", metrics);
    }

    match args.output {
        OutputFormat::Json => JsonOutput::new(
            JsonLoad {
                context: &context,
                cache: metrics,
            },
            exit_code,
        )
        .write_to(out)?,
        OutputFormat::Text if args.list => {
            text::write_file_list(out, &context.files)?;
            if let Some(metrics) = &metrics {
                text::write_cache_metrics(out, metrics)?;
            }
        }
        OutputFormat::Text => text::write_context(out, &context)?,
    }

    Ok(exit_code)
}

fn run_scan<W: Write>(config: &Config, args: ScanArgs, out: &mut W) -> Result<ExitCode> {
    let root = target_dir(args.path)?;
    let mut options = config.scan_options();
    if let Some(max_depth) = args.max_depth {
        options.max_depth = max_depth;
    }
    if let Some(max_dirs) = args.max_dirs {
        options.max_dirs = max_dirs.max(1);
    }
    options.ignore_patterns.extend(args.ignore_patterns);

    let result = DirectoryScanner::new(&root, options)
        .scan()
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    match args.output {
        OutputFormat::Json => {
            JsonOutput::new(JsonScanSummary::from_scan_result(&result), ExitCode::Success)
                .write_to(out)?;
        }
        OutputFormat::Text => text::write_scan(out, &result)?,
    }
    Ok(ExitCode::Success)
}

fn run_migrate<W: Write>(mut config: Config, args: MigrateArgs, out: &mut W) -> Result<ExitCode> {
    let working_dir = target_dir(args.path)?;
    if args.keep_originals {
        config.migration.keep_originals = true;
    }
    let options = DetectOptions::from_config(&config).with_include_global(!args.no_global);
    let service = MigrationService::new(Arc::new(config))?;

    let legacy = service.detect_legacy_files(&working_dir, &options);
    let plan = service.suggest_migration(&legacy);
    let can_auto_migrate = service.can_auto_migrate(&plan);
    let result = args
        .execute
        .then(|| service.execute_migration(&plan, args.force));

    let exit_code = match &result {
        Some(result) if !result.success => ExitCode::PartialSuccess,
        _ => ExitCode::Success,
    };

    match args.output {
        OutputFormat::Json => JsonOutput::new(
            JsonMigration {
                plan: &plan,
                can_auto_migrate,
                result: result.as_ref(),
            },
            exit_code,
        )
        .write_to(out)?,
        OutputFormat::Text => text::write_migration(out, &plan, result.as_ref())?,
    }
    Ok(exit_code)
}
