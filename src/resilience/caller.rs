//! Breaker + retry composition used by every upstream client

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use super::clock::{Sleeper, TokioSleeper};
use super::context::RequestContext;
use super::retry::{retry_with, RetryPolicy};
use crate::error::{InsightError, InsightResult};

/// Outbound-call protector shared by all requests to one upstream.
///
/// One logical call is one breaker outcome: the retries happen inside the
/// breaker, and only the final result is recorded.
pub struct ResilientCaller {
    breaker: CircuitBreaker,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    attempt_timeout: Duration,
}

impl ResilientCaller {
    /// Create a caller with real timers
    pub fn new(
        name: impl Into<String>,
        breaker: CircuitBreakerConfig,
        policy: RetryPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self::from_parts(
            CircuitBreaker::new(name, breaker),
            policy,
            Arc::new(TokioSleeper),
            attempt_timeout,
        )
    }

    /// Create a caller from pre-built parts (custom clock or sleeper)
    pub fn from_parts(
        breaker: CircuitBreaker,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            breaker,
            policy,
            sleeper,
            attempt_timeout,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Run `op` with breaker, retry, per-attempt timeout and `ctx`.
    ///
    /// Callers only ever see `Unavailable`, `Permanent`, `Decode`, `NotFound`
    /// or `Cancelled`; transient failures are absorbed or turned into
    /// `Unavailable` once retries run out.
    pub async fn call<T, F, Fut>(&self, ctx: &RequestContext, mut op: F) -> InsightResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = InsightResult<T>>,
    {
        let name = self.breaker.name();
        let timeout = self.attempt_timeout;

        let retried = retry_with(
            &self.policy,
            self.sleeper.as_ref(),
            ctx,
            InsightError::is_retryable,
            |attempt| {
                debug!(upstream = %name, attempt, "calling upstream");
                let fut = op();
                async move {
                    match tokio::time::timeout(timeout, fut).await {
                        Ok(res) => res,
                        Err(_) => Err(InsightError::Transient(format!(
                            "attempt {} timed out after {:?}",
                            attempt, timeout
                        ))),
                    }
                }
            },
        );

        self.breaker.call(move || retried).await
    }
}
