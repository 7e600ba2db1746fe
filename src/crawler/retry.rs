//! Retry policy for page fetches
//!
//! The policy is an explicit value applied by the fetcher: a per-URL
//! attempt budget, an optional pause between attempts, and a
//! classification function deciding which errors are worth another try.
//! Every URL runs its own loop; nothing is coordinated across URLs.

use crate::crawler::fetcher::FetchError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Fatal,
}

/// Why a URL was given up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Every attempt in the budget failed with a retryable error
    ExhaustedRetries,

    /// The classifier declared the error not worth retrying
    Fatal,
}

/// Terminal failure of a retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaveUp {
    pub kind: FailureKind,
    pub last_error: FetchError,
    pub attempts: u32,
}

/// Default classification: every fetch error is transient
///
/// Both transport failures and block pages tend to clear up on a fresh
/// proxy session, which is what another attempt gets.
pub fn retry_all(_error: &FetchError) -> RetryDecision {
    RetryDecision::Retry
}

/// Bounded-attempt retry policy
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    classify: fn(&FetchError) -> RetryDecision,
}

impl RetryPolicy {
    /// A policy allowing `max_attempts` tries per URL (at least one)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
            classify: retry_all,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_classifier(mut self, classify: fn(&FetchError) -> RetryDecision) -> Self {
        self.classify = classify;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn classify(&self, error: &FetchError) -> RetryDecision {
        (self.classify)(error)
    }

    /// Runs `operation` until it succeeds or the budget is spent
    ///
    /// `budget` overrides the policy's attempt count for this call. On
    /// success the value is returned with the number of attempts used.
    pub async fn execute<T, F, Fut>(
        &self,
        budget: Option<u32>,
        mut operation: F,
    ) -> Result<(T, u32), GaveUp>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = budget.unwrap_or(self.max_attempts).max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok((value, attempt)),
                Err(err) => err,
            };

            if self.classify(&err) == RetryDecision::Fatal {
                return Err(GaveUp {
                    kind: FailureKind::Fatal,
                    last_error: err,
                    attempts: attempt,
                });
            }

            if attempt >= max_attempts {
                return Err(GaveUp {
                    kind: FailureKind::ExhaustedRetries,
                    last_error: err,
                    attempts: attempt,
                });
            }

            tracing::debug!(
                attempt,
                max_attempts,
                error = %err,
                "Fetch attempt failed, retrying"
            );

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
