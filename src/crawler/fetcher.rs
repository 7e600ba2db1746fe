//! Retrying page fetcher
//!
//! This module wraps a [`PageTransport`] with:
//! - The content validity check (block pages count as failures)
//! - The per-URL [`RetryPolicy`]
//! - A bounded pool for fetching many URLs concurrently
//!
//! Results come back in input order no matter which request finished
//! first.

use crate::crawler::retry::{FailureKind, GaveUp, RetryPolicy};
use crate::crawler::transport::{PageTransport, TransportError};
use crate::crawler::validity::ValidityCheck;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A single page to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,

    /// Overrides the attempt budget for this URL only
    pub max_attempts: Option<u32>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl From<String> for FetchRequest {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl From<&str> for FetchRequest {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Failure of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid content from {url}: expected markup missing")]
    InvalidContent { url: String },

    #[error("Fetch task for {url} aborted: {message}")]
    Aborted { url: String, message: String },
}

/// Outcome of fetching one URL, attempts included
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success {
        url: String,
        body: String,
        attempts: u32,
    },
    Failure {
        url: String,
        kind: FailureKind,
        error: FetchError,
        attempts: u32,
    },
}

impl FetchResult {
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Success { body, .. } => Some(body),
            Self::Failure { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failure { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    fn from_outcome(url: String, outcome: Result<(String, u32), GaveUp>) -> Self {
        match outcome {
            Ok((body, attempts)) => Self::Success {
                url,
                body,
                attempts,
            },
            Err(gave_up) => Self::Failure {
                url,
                kind: gave_up.kind,
                error: gave_up.last_error,
                attempts: gave_up.attempts,
            },
        }
    }
}

/// Fetch results keyed by URL, iterating in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchBatch {
    results: Vec<FetchResult>,
}

impl FetchBatch {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&FetchResult> {
        self.results.iter().find(|r| r.url() == url)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FetchResult> {
        self.results.iter()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }
}

impl IntoIterator for FetchBatch {
    type Item = FetchResult;
    type IntoIter = std::vec::IntoIter<FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Transport + validity check + retry policy
#[derive(Clone)]
pub struct RetryingFetcher {
    transport: Arc<dyn PageTransport>,
    validity: Arc<ValidityCheck>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(
        transport: Arc<dyn PageTransport>,
        validity: ValidityCheck,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            validity: Arc::new(validity),
            policy,
        }
    }

    /// Same transport and policy, judged by another validity check
    pub fn with_validity(mut self, validity: ValidityCheck) -> Self {
        self.validity = Arc::new(validity);
        self
    }

    /// Fetches one URL, retrying per the policy
    pub async fn fetch_one(&self, request: FetchRequest) -> FetchResult {
        fetch_with_retry(
            self.transport.as_ref(),
            &self.validity,
            &self.policy,
            request.url,
            request.max_attempts,
        )
        .await
    }

    /// Fetches every URL with at most `max_parallel` requests in flight
    ///
    /// `max_attempts` is the per-URL budget unless a request carries its
    /// own. A URL that fails does not affect the others.
    pub async fn fetch_all<I>(&self, requests: I, max_parallel: usize, max_attempts: u32) -> FetchBatch
    where
        I: IntoIterator,
        I::Item: Into<FetchRequest>,
    {
        let requests: Vec<FetchRequest> = requests.into_iter().map(Into::into).collect();
        let urls: Vec<String> = requests.iter().map(|r| r.url.clone()).collect();

        let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
        let mut tasks = JoinSet::new();

        for (index, request) in requests.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let transport = Arc::clone(&self.transport);
            let validity = Arc::clone(&self.validity);
            let policy = self.policy.clone();
            let budget = request.max_attempts.or(Some(max_attempts));

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result =
                    fetch_with_retry(transport.as_ref(), &validity, &policy, request.url, budget)
                        .await;
                (index, result)
            });
        }

        // Pre-sized slots keep input order regardless of completion order
        let mut slots: Vec<Option<FetchResult>> = (0..urls.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("Fetch task failed to complete: {}", e),
            }
        }

        let results = slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| {
                slot.unwrap_or_else(|| FetchResult::Failure {
                    error: FetchError::Aborted {
                        url: url.clone(),
                        message: "task did not complete".to_string(),
                    },
                    url,
                    kind: FailureKind::Fatal,
                    attempts: 0,
                })
            })
            .collect();

        FetchBatch { results }
    }
}

async fn fetch_with_retry(
    transport: &dyn PageTransport,
    validity: &ValidityCheck,
    policy: &RetryPolicy,
    url: String,
    budget: Option<u32>,
) -> FetchResult {
    let target = url.as_str();
    let outcome = policy
        .execute(budget, || async move {
            let body = transport.fetch(target).await?;
            if validity.is_valid(&body) {
                Ok(body)
            } else {
                Err(FetchError::InvalidContent {
                    url: target.to_string(),
                })
            }
        })
        .await;

    match &outcome {
        Ok((_, attempts)) if *attempts > 1 => {
            tracing::debug!("Fetched {} after {} attempts", url, attempts);
        }
        Err(gave_up) => {
            tracing::warn!(
                url = %url,
                attempts = gave_up.attempts,
                kind = ?gave_up.kind,
                error = %gave_up.last_error,
                "Giving up on page"
            );
        }
        _ => {}
    }

    FetchResult::from_outcome(url, outcome)
}
