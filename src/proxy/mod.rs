//! Upstream proxy strategies
//!
//! Every page request goes through exactly one strategy, chosen in the
//! `[proxy]` table. Credentials come from the environment.

mod strategy;

pub use strategy::{
    ProxyCredentials, ProxyStrategy, StrategyKind, PROXY_CUSTOMER_VAR, PROXY_PASSWORD_VAR,
    PROXY_ZONE_VAR, SCRAPER_API_KEY_VAR,
};
