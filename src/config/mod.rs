//! Configuration module for doc-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, and command-line flags are layered on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use doc_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, GitHubConfig, HttpConfig, OutputConfig, OutputFormat, SelectorConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
pub(crate) use validation::parse_selector;
