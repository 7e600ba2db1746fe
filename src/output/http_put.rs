//! Object-storage sink over HTTP PUT

use crate::crawler::ListingRecord;
use crate::output::encode::{object_key, to_csv_bytes};
use crate::output::{ListingSink, SinkError, SinkResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::CONTENT_TYPE;

/// PUTs the CSV to `{base_url}/{date}-{location}.csv`
#[derive(Debug, Clone)]
pub struct HttpPutSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPutSink {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ListingSink for HttpPutSink {
    async fn deliver(
        &self,
        records: &[ListingRecord],
        location: &str,
        date: NaiveDate,
    ) -> SinkResult<String> {
        let bytes = to_csv_bytes(records)?;
        let url = self.object_url(&object_key(date, location));

        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "text/csv")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                status: status.as_u16(),
                url,
            });
        }

        tracing::info!(url = %url, records = records.len(), "Uploaded CSV");
        Ok(url)
    }

    fn name(&self) -> &'static str {
        "http-put"
    }
}
