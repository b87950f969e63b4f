//! Configuration module for Baku-Dine
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and layering command-line overrides on top of it.
//!
//! # Example
//!
//! ```no_run
//! use baku_dine::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("baku-dine.toml")).unwrap();
//! println!("Concurrency cap: {}", config.crawler.max_concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, Overrides, SiteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, resolve_config};
pub use validation::validate;
