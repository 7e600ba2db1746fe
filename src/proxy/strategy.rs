//! Proxy strategies and their credentials
//!
//! A strategy only decides how a target URL is rewritten and which
//! forward proxy (if any) the client goes through. Everything after the
//! request is strategy-agnostic.

use crate::config::Config;
use crate::ConfigError;
use serde::Deserialize;
use std::fmt;

/// Environment variable holding the ScraperAPI key
pub const SCRAPER_API_KEY_VAR: &str = "SCRAPER_API_KEY";
/// Environment variables holding the zone proxy triplet
pub const PROXY_CUSTOMER_VAR: &str = "PROXY_CUSTOMER";
pub const PROXY_ZONE_VAR: &str = "PROXY_ZONE";
pub const PROXY_PASSWORD_VAR: &str = "PROXY_PASSWORD";

/// Strategy identifier as written in the configuration file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Request the target directly
    #[default]
    Direct,

    /// Route through the ScraperAPI rendering endpoint
    ScraperApi,

    /// Route through an authenticated customer/zone forward proxy
    ZoneProxy,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ScraperApi => "scraper-api",
            Self::ZoneProxy => "zone-proxy",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for the selected strategy
#[derive(Clone, Default, PartialEq, Eq)]
pub enum ProxyCredentials {
    #[default]
    None,
    ApiKey(String),
    Zone {
        customer: String,
        zone: String,
        password: String,
    },
}

impl ProxyCredentials {
    /// Reads the credentials `kind` needs through `lookup`
    ///
    /// Only the selected strategy's variables are required; a direct
    /// strategy needs none.
    pub fn resolve<F>(kind: StrategyKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredential(name))
        };

        match kind {
            StrategyKind::Direct => Ok(Self::None),
            StrategyKind::ScraperApi => Ok(Self::ApiKey(require(SCRAPER_API_KEY_VAR)?)),
            StrategyKind::ZoneProxy => Ok(Self::Zone {
                customer: require(PROXY_CUSTOMER_VAR)?,
                zone: require(PROXY_ZONE_VAR)?,
                password: require(PROXY_PASSWORD_VAR)?,
            }),
        }
    }
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::Zone { customer, zone, .. } => f
                .debug_struct("Zone")
                .field("customer", customer)
                .field("zone", zone)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// A fully resolved proxy strategy
#[derive(Clone)]
pub enum ProxyStrategy {
    Direct,
    ScraperApi {
        endpoint: String,
        api_key: String,
    },
    ZoneProxy {
        proxy_url: String,
        username: String,
        password: String,
    },
}

impl ProxyStrategy {
    /// Builds the strategy selected in `config` from its resolved credentials
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match (config.proxy.strategy, &config.credentials) {
            (StrategyKind::Direct, _) => Ok(Self::Direct),
            (StrategyKind::ScraperApi, ProxyCredentials::ApiKey(key)) => Ok(Self::ScraperApi {
                endpoint: config.proxy.endpoint.trim_end_matches('/').to_string(),
                api_key: key.clone(),
            }),
            (StrategyKind::ScraperApi, _) => {
                Err(ConfigError::MissingCredential(SCRAPER_API_KEY_VAR))
            }
            (
                StrategyKind::ZoneProxy,
                ProxyCredentials::Zone {
                    customer,
                    zone,
                    password,
                },
            ) => {
                let proxy_url = config.proxy.proxy_url.clone().ok_or_else(|| {
                    ConfigError::Validation(
                        "proxy-url is required for the zone-proxy strategy".to_string(),
                    )
                })?;
                Ok(Self::ZoneProxy {
                    proxy_url,
                    username: format!("lum-customer-{}-zone-{}", customer, zone),
                    password: password.clone(),
                })
            }
            (StrategyKind::ZoneProxy, _) => Err(ConfigError::MissingCredential(PROXY_CUSTOMER_VAR)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Direct => StrategyKind::Direct,
            Self::ScraperApi { .. } => StrategyKind::ScraperApi,
            Self::ZoneProxy { .. } => StrategyKind::ZoneProxy,
        }
    }

    /// The URL actually requested for `target`
    ///
    /// ScraperAPI gets the target percent-encoded into its query string.
    pub fn request_url(&self, target: &str) -> String {
        match self {
            Self::Direct | Self::ZoneProxy { .. } => target.to_string(),
            Self::ScraperApi { endpoint, api_key } => {
                let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
                format!("{}/?api_key={}&url={}", endpoint, api_key, encoded)
            }
        }
    }

    /// Forward proxy the HTTP client must be built with, if any
    pub fn client_proxy(&self) -> Result<Option<reqwest::Proxy>, reqwest::Error> {
        match self {
            Self::ZoneProxy {
                proxy_url,
                username,
                password,
            } => Ok(Some(
                reqwest::Proxy::all(proxy_url.as_str())?.basic_auth(username, password),
            )),
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for ProxyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("Direct"),
            Self::ScraperApi { endpoint, .. } => f
                .debug_struct("ScraperApi")
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            Self::ZoneProxy {
                proxy_url, username, ..
            } => f
                .debug_struct("ZoneProxy")
                .field("proxy_url", proxy_url)
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}
