//! Bounded retry with linear backoff

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::clock::Sleeper;
use super::context::RequestContext;
use crate::error::{InsightError, InsightResult};

/// Retry limits for one logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay unit: attempt `n` is followed by `n * backoff_step`
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_step,
        }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        linear_backoff(self.backoff_step, attempt)
    }
}

/// `step * attempt`
pub fn linear_backoff(step: Duration, attempt: u32) -> Duration {
    step.saturating_mul(attempt)
}

/// Run `op` until it succeeds, fails with an error `classify` rejects, or
/// the attempts run out.
///
/// `op` receives the 1-based attempt number. Attempts and backoff sleeps both
/// run under `ctx`, so cancellation interrupts either one. Exhausting the
/// attempts yields `Unavailable` carrying the last transient error.
pub async fn retry_with<T, F, Fut, C>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    ctx: &RequestContext,
    classify: C,
    mut op: F,
) -> InsightResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = InsightResult<T>>,
    C: Fn(&InsightError) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match ctx.run(op(attempt)).await {
            Ok(value) => return Ok(value),
            Err(e) if classify(&e) => {
                warn!(attempt, max_attempts, error = %e, "retryable upstream failure");
                last_error = Some(e);
                if attempt < max_attempts {
                    let delay = policy.delay_for(attempt);
                    ctx.run(async {
                        sleeper.sleep(delay).await;
                        Ok(())
                    })
                    .await?;
                }
            }
            Err(e) => return Err(e),
        }
    }

    let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
    Err(InsightError::Unavailable(format!(
        "retries exhausted after {} attempts: {}",
        max_attempts, detail
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::resilience::clock::RecordingSleeper;

    #[test]
    fn test_linear_backoff() {
        let step = Duration::from_secs(1);
        assert_eq!(linear_backoff(step, 1), Duration::from_secs(1));
        assert_eq!(linear_backoff(step, 2), Duration::from_secs(2));
        assert_eq!(linear_backoff(step, 3), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let res = retry_with(
            &RetryPolicy::default(),
            sleeper.as_ref(),
            &RequestContext::new(),
            InsightError::is_retryable,
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(InsightError::Transient("503".into()))
                    } else {
                        Ok("done")
                    }
                }
            },
        )
        .await;

        assert_eq!(res.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.calls(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_permanent_is_not_retried() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let res: InsightResult<()> = retry_with(
            &RetryPolicy::default(),
            sleeper.as_ref(),
            &RequestContext::new(),
            InsightError::is_retryable,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(InsightError::permanent(404, "nope")) }
            },
        )
        .await;

        assert!(matches!(res, Err(InsightError::Permanent { code: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn test_decode_is_not_retried() {
        let calls = AtomicU32::new(0);
        let res: InsightResult<()> = retry_with(
            &RetryPolicy::default(),
            RecordingSleeper::new().as_ref(),
            &RequestContext::new(),
            InsightError::is_retryable,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(InsightError::Decode("bad json".into())) }
            },
        )
        .await;

        assert!(matches!(res, Err(InsightError::Decode(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_is_unavailable() {
        let sleeper = RecordingSleeper::new();
        let res: InsightResult<()> = retry_with(
            &RetryPolicy::default(),
            sleeper.as_ref(),
            &RequestContext::new(),
            InsightError::is_retryable,
            |_| async { Err(InsightError::Transient("reset".into())) },
        )
        .await;

        match res {
            Err(InsightError::Unavailable(msg)) => assert!(msg.contains("reset")),
            other => panic!("unexpected {:?}", other),
        }
        // no sleep after the final attempt
        assert_eq!(sleeper.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_backoff() {
        struct CancellingSleeper(RequestContext);

        #[async_trait::async_trait]
        impl Sleeper for CancellingSleeper {
            async fn sleep(&self, _duration: Duration) {
                self.0.cancel();
                std::future::pending::<()>().await;
            }
        }

        let ctx = RequestContext::new();
        let sleeper = Arc::new(CancellingSleeper(ctx.clone()));
        let calls = AtomicU32::new(0);

        let res: InsightResult<()> = retry_with(
            &RetryPolicy::default(),
            sleeper.as_ref(),
            &ctx,
            InsightError::is_retryable,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(InsightError::Transient("503".into())) }
            },
        )
        .await;

        assert!(matches!(res, Err(InsightError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
