//! Local directory sink

use crate::crawler::ListingRecord;
use crate::output::encode::{object_key, to_csv_bytes};
use crate::output::{ListingSink, SinkResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Writes `{date}-{location}.csv` into a directory, creating it if needed
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ListingSink for DirectorySink {
    async fn deliver(
        &self,
        records: &[ListingRecord],
        location: &str,
        date: NaiveDate,
    ) -> SinkResult<String> {
        let bytes = to_csv_bytes(records)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.root.join(object_key(date, location));
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(path = %path.display(), records = records.len(), "Wrote CSV");
        Ok(path.display().to_string())
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}
