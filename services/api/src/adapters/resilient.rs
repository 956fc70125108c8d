//! services/api/src/adapters/resilient.rs
//!
//! Wraps any `QuestionAnsweringService` with a per-attempt timeout and a bounded
//! retry with exponential backoff.

use async_trait::async_trait;
use docqa_core::ports::{PortError, PortResult, QuestionAnsweringService};
use std::time::Duration;
use tracing::warn;

/// How long to wait for each attempt and how often to try again.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

pub struct ResilientQaService<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> ResilientQaService<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

/// Only failures of the remote call itself are worth another attempt.
fn is_transient(err: &PortError) -> bool {
    matches!(err, PortError::Unexpected(_))
}

#[async_trait]
impl<S> QuestionAnsweringService for ResilientQaService<S>
where
    S: QuestionAnsweringService,
{
    async fn answer(&self, prompt: &str) -> PortResult<String> {
        let attempts = self.policy.max_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.policy.delay_before(attempt)).await;
            }

            let err = match tokio::time::timeout(self.policy.timeout, self.inner.answer(prompt)).await
            {
                Ok(Ok(answer)) => return Ok(answer),
                Ok(Err(e)) => e,
                Err(_) => PortError::Unexpected(format!(
                    "answering model timed out after {:?}",
                    self.policy.timeout
                )),
            };

            warn!(
                attempt = attempt + 1,
                max_attempts = attempts,
                error = %err,
                "Answering model call failed."
            );
            if !is_transient(&err) {
                return Err(err);
            }
            last_error = Some(err);
        }

        Err(last_error.unwrap_or_else(|| {
            PortError::Unexpected("answering model was never called".to_string())
        }))
    }
}
