//! Configuration module for LandWatch Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and resolving proxy credentials from the environment once at
//! startup.
//!
//! # Example
//!
//! ```no_run
//! use landwatch_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Attempts per page: {}", config.fetcher.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, JobDescriptor, OutputConfig, ProxyConfig, SinkKind};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, resolve_credentials,
};
pub use validation::validate_job;
