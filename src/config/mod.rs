//! Configuration module for Site-Ingest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_ingest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("acme.toml")).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, RenderConfig, RenderMode, SiteConfig, UserAgentConfig,
    WaitUntil,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{canonicalize, validate, MAX_PAGES_LIMIT};
