use crate::config::types::Config;
use crate::config::validation::validate;
use crate::proxy::ProxyCredentials;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads, validates and resolves a configuration file
///
/// Credentials for the selected proxy strategy are read from the process
/// environment here, once; nothing downstream touches the environment.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use landwatch_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Max parallel: {}", config.fetcher.max_parallel);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    resolve_credentials(config, |name| std::env::var(name).ok())
}

/// Parses and validates configuration text without touching the environment
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Fills in the credentials of the selected strategy using `lookup`
pub fn resolve_credentials<F>(mut config: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    config.credentials = ProxyCredentials::resolve(config.proxy.strategy, lookup)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the exact settings used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
