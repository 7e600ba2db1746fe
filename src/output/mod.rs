//! Output module for delivering harvested listings
//!
//! This module handles:
//! - Encoding records as CSV
//! - Delivering the CSV to a local directory or an object store
//! - Summarizing the run

mod directory;
mod encode;
mod http_put;
pub mod stats;
mod traits;

pub use directory::DirectorySink;
pub use encode::{object_key, to_csv_bytes};
pub use http_put::HttpPutSink;
pub use stats::{print_summary, HarvestSummary};
pub use traits::{ListingSink, SinkError, SinkResult};

use crate::config::{JobDescriptor, SinkKind};
use std::sync::Arc;

/// Builds the sink selected by the configuration for a job
///
/// `client` is only used by the upload sink.
pub fn build_sink(kind: SinkKind, job: &JobDescriptor, client: reqwest::Client) -> Arc<dyn ListingSink> {
    match kind {
        SinkKind::Directory => Arc::new(DirectorySink::new(&job.destination)),
        SinkKind::HttpPut => Arc::new(HttpPutSink::new(client, &job.destination)),
    }
}
