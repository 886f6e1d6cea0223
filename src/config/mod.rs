//! Configuration module for Listing-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; a missing file means built-in defaults.
//!
//! # Example
//!
//! ```no_run
//! use listing_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, ProxyConfig, RawConfig, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_MAX_PAGES, DEFAULT_MAX_RUNTIME_SECS, DEFAULT_RESULTS_WANTED, DEFAULT_START_URL,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, default_config, hash_content, load_config, load_config_with_hash,
    parse_config,
};
pub use validation::resolve_count;
