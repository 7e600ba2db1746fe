use crate::crawler::Marker;
use crate::proxy::{ProxyCredentials, StrategyKind};
use serde::Deserialize;

/// Main configuration structure for a harvest run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Job to run when none is given on the command line
    #[serde(default)]
    pub job: Option<JobDescriptor>,

    /// Credentials for the selected strategy, resolved from the environment
    #[serde(skip)]
    pub credentials: ProxyCredentials,
}

/// Fetching and retry behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of page requests in flight at once
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Attempts per URL before it is given up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts on the same URL, in milliseconds
    #[serde(default)]
    pub retry_delay_ms: u64,

    /// Pages per progress batch (defaults to `max-parallel`)
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Optional limit on the whole run
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Element that must be present for a fetched page to count as genuine
    #[serde(default = "default_validity_marker")]
    pub validity_marker: Marker,
}

impl FetcherConfig {
    /// Number of pages fetched between progress reports
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(self.max_parallel)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_parallel: default_max_parallel(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: 0,
            batch_size: None,
            run_timeout_secs: None,
            user_agent: default_user_agent(),
            validity_marker: default_validity_marker(),
        }
    }
}

/// Upstream proxy selection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// API endpoint for the `scraper-api` strategy
    #[serde(default = "default_scraper_api_endpoint")]
    pub endpoint: String,

    /// Forward proxy address for the `zone-proxy` strategy
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            endpoint: default_scraper_api_endpoint(),
            proxy_url: None,
        }
    }
}

/// Where the CSV ends up
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub kind: SinkKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Write `{date}-{location}.csv` into a local directory
    #[default]
    Directory,

    /// PUT the CSV to `{destination}/{date}-{location}.csv`
    HttpPut,
}

/// A single harvest job: where to start and where the output goes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobDescriptor {
    /// First results page of the search
    pub starting_url: String,

    /// Directory path or bucket base URL, depending on the sink kind
    pub destination: String,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_parallel() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("landwatch-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_validity_marker() -> Marker {
    Marker::with_class("div", "result")
}

fn default_scraper_api_endpoint() -> String {
    "http://api.scraperapi.com".to_string()
}
