use crate::config::types::{Config, FetcherConfig, JobDescriptor, ProxyConfig, SinkKind};
use crate::crawler::Marker;
use crate::proxy::StrategyKind;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_proxy_config(&config.proxy)?;
    if let Some(job) = &config.job {
        validate_job(job, config.output.kind)?;
    }
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.max_parallel < 1 || config.max_parallel > 100 {
        return Err(ConfigError::Validation(format!(
            "max-parallel must be between 1 and 100, got {}",
            config.max_parallel
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.batch_size == Some(0) {
        return Err(ConfigError::Validation(
            "batch-size must be >= 1".to_string(),
        ));
    }

    if config.run_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "run-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    validate_marker(&config.validity_marker)
}

/// Validates the validity marker: plain identifiers only
fn validate_marker(marker: &Marker) -> Result<(), ConfigError> {
    let is_ident = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    };

    if !is_ident(&marker.tag) {
        return Err(ConfigError::Validation(format!(
            "validity-marker tag '{}' is not a valid element name",
            marker.tag
        )));
    }

    if let Some(class) = &marker.class {
        if !is_ident(class) {
            return Err(ConfigError::Validation(format!(
                "validity-marker class '{}' is not a valid class name",
                class
            )));
        }
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    match config.strategy {
        StrategyKind::Direct => Ok(()),
        StrategyKind::ScraperApi => {
            validate_http_url(&config.endpoint, "endpoint")?;
            Ok(())
        }
        StrategyKind::ZoneProxy => {
            let proxy_url = config.proxy_url.as_deref().ok_or_else(|| {
                ConfigError::Validation(
                    "proxy-url is required for the zone-proxy strategy".to_string(),
                )
            })?;
            validate_http_url(proxy_url, "proxy-url")?;
            Ok(())
        }
    }
}

/// Validates a job descriptor against the configured sink
pub fn validate_job(job: &JobDescriptor, sink: SinkKind) -> Result<(), ConfigError> {
    validate_http_url(&job.starting_url, "starting-url")?;

    if job.destination.trim().is_empty() {
        return Err(ConfigError::Validation(
            "destination cannot be empty".to_string(),
        ));
    }

    if sink == SinkKind::HttpPut {
        validate_http_url(&job.destination, "destination")?;
    }

    Ok(())
}

fn validate_http_url(raw: &str, field: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, raw
        )));
    }

    Ok(url)
}
