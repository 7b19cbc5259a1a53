//! Logging setup for the `yelm-context` binary.
//!
//! The library only emits records through the `log` facade; the binary
//! installs an `env_logger` backend. The level comes from (first wins):
//!
//! 1. The `RUST_LOG` environment variable
//! 2. CLI flags: `--quiet` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. Default: warn, so that only skipped files and rename suggestions
//!    show up next to the command's own output
//!
//! Records go to stderr; stdout carries only command output.
//!
//! # Example
//!
//! ```rust,no_run
//! use yelm_context::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible at -v");
//! ```

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Install the logger. Calling it again is a no-op.
pub fn init_logging(verbose: u8, quiet: bool) {
    let use_env = env::var("RUST_LOG").is_ok();
    let level = determine_level(verbose, quiet);

    let mut builder = Builder::new();
    builder.target(Target::Stderr);
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level);
    }

    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    if use_env {
        log::debug!("Logging initialized from RUST_LOG: {:?}", env::var("RUST_LOG").ok());
    } else {
        log::debug!("Logging initialized at level: {:?}", level);
    }
}

/// Level selected by the CLI flags alone.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Module paths are shown from `-v` on; timestamps only in debug builds.
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);

        #[cfg(debug_assertions)]
        write!(buf, "{} ", buf.timestamp_seconds())?;

        if verbose >= 1 {
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} [{}] {}",
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{level_style}{:<5}{level_style:#} {}", level, record.args())
        }
    });
}
