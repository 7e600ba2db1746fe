//! LandWatch Harvest: a listing acquisition pipeline
//!
//! This crate fetches a paginated set of land listings through an
//! anti-bot proxy, extracts one flat record per listing and hands the
//! resulting CSV to an output sink.

pub mod config;
pub mod crawler;
pub mod output;
pub mod proxy;
pub mod state;

use thiserror::Error;

/// Main error type for harvest runs
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Landing page {url} could not be fetched: {reason}")]
    LandingUnavailable { url: String, reason: String },

    #[error("Malformed landing page: {0}")]
    MalformedLandingPage(String),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Invalid stage transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PipelineStage,
        to: state::PipelineStage,
    },

    #[error("Run exceeded the {secs}s time limit")]
    Timeout { secs: u64 },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing environment variable {0} required by the selected proxy strategy")]
    MissingCredential(&'static str),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ListingRecord, PageContext};
pub use state::PipelineStage;
