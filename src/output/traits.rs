//! Output sink trait and errors
//!
//! A sink receives the flattened records of one run and persists them as
//! a single CSV object named `{date}-{location}.csv`.

use crate::crawler::ListingRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while delivering output
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Upload failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload to {url} rejected with HTTP {status}")]
    Status { status: u16, url: String },
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for the records of a run
///
/// Implementations must be thread-safe. Delivery is attempted once;
/// failures are reported to the caller rather than retried.
#[async_trait]
pub trait ListingSink: Send + Sync {
    /// Persists `records` and returns a locator for the written object
    ///
    /// # Arguments
    ///
    /// * `records` - Records of the run, in page order
    /// * `location` - Location label of the result set
    /// * `date` - Run date, part of the object name
    async fn deliver(
        &self,
        records: &[ListingRecord],
        location: &str,
        date: NaiveDate,
    ) -> SinkResult<String>;

    /// Short name for log lines
    fn name(&self) -> &'static str;
}
