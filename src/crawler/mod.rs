//! Crawler module for listing acquisition
//!
//! This module contains the core harvesting logic, including:
//! - Typed lookups over parsed result pages
//! - HTTP transport through the selected proxy strategy
//! - Validity checking and per-URL retry with a bounded pool
//! - Landing-page analysis and per-listing extraction
//! - Overall run orchestration

mod analyzer;
mod document;
mod extractor;
mod fetcher;
mod pipeline;
pub mod record;
mod retry;
mod transport;
mod validity;

pub use analyzer::{analyze, analyze_document, PageContext, PAGE_SIZE};
pub use document::{Document, Marker, Node};
pub use extractor::{ExtractError, ListingExtractor, PageExtraction, SITE_BASE_URL};
pub use fetcher::{FetchBatch, FetchError, FetchRequest, FetchResult, RetryingFetcher};
pub use pipeline::Harvester;
pub use record::{Acreage, ListingRecord};
pub use retry::{retry_all, FailureKind, RetryDecision, RetryPolicy};
pub use transport::{build_http_client, HttpTransport, PageTransport, TransportError};
pub use validity::ValidityCheck;

use crate::config::Config;
use crate::output::{HarvestSummary, ListingSink};
use crate::HarvestError;
use std::sync::Arc;

/// Runs a complete harvest of one result set
///
/// This is the main entry point for a job. It will:
/// 1. Build the transport for the configured proxy strategy
/// 2. Fetch and analyze the landing page
/// 3. Fetch the remaining pages and extract their listings
/// 4. Deliver the records to `sink`
///
/// # Example
///
/// ```no_run
/// use landwatch_harvest::config::load_config;
/// use landwatch_harvest::crawler::harvest;
/// use landwatch_harvest::output::DirectorySink;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let sink = Arc::new(DirectorySink::new("./out"));
/// let summary = harvest(&config, "https://www.landwatch.com/Texas_land_for_sale", sink).await?;
/// println!("{} records", summary.records);
/// # Ok(())
/// # }
/// ```
pub async fn harvest(
    config: &Config,
    starting_url: &str,
    sink: Arc<dyn ListingSink>,
) -> Result<HarvestSummary, HarvestError> {
    Harvester::from_config(config, sink)?.run(starting_url).await
}
