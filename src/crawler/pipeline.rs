//! Harvest pipeline - run orchestration
//!
//! One run walks the stage machine in [`PipelineStage`] order:
//! - Fetch the landing page, accepting an empty search
//! - Analyze it into a [`PageContext`]
//! - Fetch the remaining pages in batches through the bounded pool
//! - Extract records from every page that came back valid
//! - Deliver the flattened records to the sink
//!
//! A landing page that cannot be fetched or analyzed aborts the run before
//! any pool work starts. Pages that exhaust their retries contribute no
//! listings but do not stop the run.

use crate::config::{Config, FetcherConfig};
use crate::crawler::analyzer::{analyze, PageContext};
use crate::crawler::extractor::ListingExtractor;
use crate::crawler::fetcher::{FetchRequest, FetchResult, RetryingFetcher};
use crate::crawler::record::ListingRecord;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::transport::HttpTransport;
use crate::crawler::validity::ValidityCheck;
use crate::output::{HarvestSummary, ListingSink};
use crate::proxy::ProxyStrategy;
use crate::state::{PipelineStage, StageTracker};
use crate::HarvestError;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runs harvest jobs against one transport and one sink
pub struct Harvester {
    landing: RetryingFetcher,
    fetcher: RetryingFetcher,
    extractor: ListingExtractor,
    sink: Arc<dyn ListingSink>,
    max_parallel: usize,
    max_attempts: u32,
    batch_size: usize,
    run_timeout: Option<Duration>,
}

impl Harvester {
    /// Creates a harvester from an assembled fetcher and sink
    ///
    /// The landing page is fetched with the same transport and policy but
    /// judged by [`ValidityCheck::landing`] over the configured marker.
    pub fn new(settings: &FetcherConfig, fetcher: RetryingFetcher, sink: Arc<dyn ListingSink>) -> Self {
        let landing = fetcher
            .clone()
            .with_validity(ValidityCheck::landing(settings.validity_marker.clone()));
        Self {
            landing,
            fetcher,
            extractor: ListingExtractor::default(),
            sink,
            max_parallel: settings.max_parallel,
            max_attempts: settings.max_attempts,
            batch_size: settings.effective_batch_size().max(1),
            run_timeout: settings.run_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Creates a harvester with the HTTP transport the configuration selects
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved configuration, credentials included
    /// * `sink` - Where the records of each run are delivered
    pub fn from_config(config: &Config, sink: Arc<dyn ListingSink>) -> Result<Self, HarvestError> {
        let strategy = ProxyStrategy::from_config(config)?;
        tracing::info!(strategy = %strategy.kind(), "Using proxy strategy");

        let transport = HttpTransport::new(&config.fetcher, strategy)?;
        let fetcher = RetryingFetcher::new(
            Arc::new(transport),
            ValidityCheck::new(config.fetcher.validity_marker.clone()),
            RetryPolicy::new(config.fetcher.max_attempts)
                .with_delay(Duration::from_millis(config.fetcher.retry_delay_ms)),
        );

        Ok(Self::new(&config.fetcher, fetcher, sink))
    }

    /// Replaces the extractor, e.g. to resolve links against another origin
    pub fn with_extractor(mut self, extractor: ListingExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Runs one job, stamping records with today's local date
    pub async fn run(&self, starting_url: &str) -> Result<HarvestSummary, HarvestError> {
        self.run_at(starting_url, Local::now().date_naive()).await
    }

    /// Runs one job, stamping records and the output name with `date`
    pub async fn run_at(&self, starting_url: &str, date: NaiveDate) -> Result<HarvestSummary, HarvestError> {
        let started = Instant::now();
        let mut tracker = StageTracker::new();

        let outcome = match self.run_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.run_stages(starting_url, date, &mut tracker)).await {
                    Ok(result) => result,
                    Err(_) => Err(HarvestError::Timeout {
                        secs: limit.as_secs(),
                    }),
                }
            }
            None => self.run_stages(starting_url, date, &mut tracker).await,
        };

        match outcome {
            Ok(mut summary) => {
                summary.elapsed = started.elapsed();
                tracing::info!(
                    location = %summary.location,
                    records = summary.records,
                    elapsed_secs = summary.elapsed.as_secs_f64(),
                    "Harvest complete"
                );
                Ok(summary)
            }
            Err(e) => {
                let stage = tracker.current();
                tracker.fail();
                tracing::error!(stage = %stage, error = %e, "Harvest failed");
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        starting_url: &str,
        date: NaiveDate,
        tracker: &mut StageTracker,
    ) -> Result<HarvestSummary, HarvestError> {
        tracing::info!(url = %starting_url, "Fetching landing page");
        let landing = match self.landing.fetch_one(FetchRequest::new(starting_url)).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::Failure { error, attempts, .. } => {
                return Err(HarvestError::LandingUnavailable {
                    url: starting_url.to_string(),
                    reason: format!("{} (after {} attempts)", error, attempts),
                });
            }
        };
        tracker.advance(PipelineStage::LandingFetched)?;

        let ctx = analyze(&landing)?;
        tracker.advance(PipelineStage::Analyzed)?;
        tracing::info!(
            location = %ctx.location,
            results = ctx.num_of_results,
            pages = ctx.page_count(),
            "Analyzed landing page"
        );

        let mut summary = HarvestSummary {
            location: ctx.location.clone(),
            expected_results: ctx.num_of_results,
            pages_requested: ctx.page_count(),
            pages_fetched: 1,
            ..Default::default()
        };

        let mut records = Vec::new();
        self.collect(&landing, &ctx, date, &mut records, &mut summary);

        let mut pages_done = 1;
        for batch in ctx.page_urls.chunks(self.batch_size) {
            let results = self
                .fetcher
                .fetch_all(batch.iter().cloned(), self.max_parallel, self.max_attempts)
                .await;

            for result in results {
                match result {
                    FetchResult::Success { body, .. } => {
                        summary.pages_fetched += 1;
                        self.collect(&body, &ctx, date, &mut records, &mut summary);
                    }
                    FetchResult::Failure {
                        url,
                        kind,
                        error,
                        attempts,
                    } => {
                        summary.pages_failed += 1;
                        tracing::warn!(
                            url = %url,
                            kind = ?kind,
                            attempts,
                            error = %error,
                            "Page given up, no listings from it"
                        );
                    }
                }
            }

            pages_done += batch.len();
            tracing::info!(
                location = %ctx.location,
                pages = pages_done,
                total_pages = ctx.page_count(),
                records = records.len(),
                "Progress"
            );
        }
        tracker.advance(PipelineStage::PagesFetched)?;

        summary.records = records.len();
        summary.error_records = records.iter().filter(|r| r.is_error()).count();
        tracker.advance(PipelineStage::Extracted)?;

        summary.output = self.sink.deliver(&records, &ctx.location, date).await?;
        tracker.advance(PipelineStage::Delivered)?;
        tracing::info!(sink = self.sink.name(), output = %summary.output, "Delivered records");

        Ok(summary)
    }

    /// Extracts one page's listings into `records`
    fn collect(
        &self,
        content: &str,
        ctx: &PageContext,
        date: NaiveDate,
        records: &mut Vec<ListingRecord>,
        summary: &mut HarvestSummary,
    ) {
        let extraction = self.extractor.extract_page(content, ctx, date);
        summary.skipped_listings += extraction.skipped;
        records.extend(extraction.records);
    }
}
