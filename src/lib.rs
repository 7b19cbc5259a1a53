//! yelm-context - hierarchical discovery of context instruction files
//!
//! Finds the files (`agents.md`, `CLAUDE.md`, `GEMINI.md`, `.cursor/rules`)
//! that carry project guidance for an assistant, picks one winner per
//! directory across global, ancestor and descendant directories, caches the
//! result per working directory and concatenates the contents with
//! provenance markers. Legacy files can be detected and migrated.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use yelm_context::cache::DiscoveryCache;
//! use yelm_context::config::Config;
//! use yelm_context::manager::ContextFileManager;
//!
//! let config = Arc::new(Config::load().unwrap());
//! let cache = Arc::new(DiscoveryCache::from_config(&config));
//! let manager = ContextFileManager::new(config).unwrap().with_cache(cache);
//! let context = manager.load(".").unwrap();
//! println!("{}", context.content);
//! ```

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod manager;
pub mod migration;
pub mod output;
pub mod patterns;
pub mod scanner;

pub use app::run_app;
