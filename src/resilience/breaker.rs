//! Circuit breaker state machine
//!
//! `Closed` counts consecutive failures and trips to `Open` at the threshold.
//! `Open` rejects every call until the cooldown has elapsed on the injected
//! clock, then moves to `HalfOpen`. `HalfOpen` admits a bounded number of
//! trial calls: any failure reopens the breaker, and once the full allowance
//! has succeeded it closes again.
//!
//! Each transition bumps a generation number. Results reported with a ticket
//! from an older generation are ignored, so a slow call admitted while
//! `Closed` cannot corrupt the counters of a later `HalfOpen` trial.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use super::clock::{Clock, SystemClock};
use crate::error::{InsightError, InsightResult};

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Breaker thresholds
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip a closed breaker
    pub failure_threshold: u32,
    /// How long the breaker stays open before probing
    pub open_timeout: Duration,
    /// Trial calls admitted while half-open
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
            half_open_max_calls: 5,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, open_timeout: Duration, half_open_max_calls: u32) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            open_timeout,
            half_open_max_calls: half_open_max_calls.max(1),
        }
    }
}

/// Admission issued by [`CircuitBreaker::allow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    generation: u64,
    consecutive_failures: u32,
    half_open_admitted: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

impl BreakerInner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            generation: 0,
            consecutive_failures: 0,
            half_open_admitted: 0,
            half_open_successes: 0,
            opened_at: None,
        }
    }

    fn transition(&mut self, to: CircuitState, now: Instant) {
        self.state = to;
        self.generation += 1;
        self.consecutive_failures = 0;
        self.half_open_admitted = 0;
        self.half_open_successes = 0;
        self.opened_at = if to == CircuitState::Open { Some(now) } else { None };
    }
}

/// Thread-safe circuit breaker shared by all callers of one upstream
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a breaker on the system clock
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Create a breaker on a custom clock
    pub fn with_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(BreakerInner::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, applying an elapsed cooldown
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, self.clock.now());
        inner.state
    }

    /// Consecutive failures counted while closed
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Ask to make a call. Fails with `Unavailable` while open, or while
    /// half-open once the trial allowance is used up.
    pub fn allow(&self) -> InsightResult<Ticket> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, now);

        match inner.state {
            CircuitState::Closed => {}
            CircuitState::Open => {
                return Err(InsightError::Unavailable(format!(
                    "circuit breaker '{}' is open",
                    self.name
                )));
            }
            CircuitState::HalfOpen => {
                if inner.half_open_admitted >= self.config.half_open_max_calls {
                    return Err(InsightError::Unavailable(format!(
                        "circuit breaker '{}' is half-open, trial allowance exhausted",
                        self.name
                    )));
                }
                inner.half_open_admitted += 1;
            }
        }

        Ok(Ticket {
            generation: inner.generation,
        })
    }

    /// Report the outcome of an admitted call
    pub fn record_result(&self, ticket: Ticket, success: bool) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, now);

        if ticket.generation != inner.generation {
            return;
        }

        match (inner.state, success) {
            (CircuitState::Closed, true) => inner.consecutive_failures = 0,
            (CircuitState::Closed, false) => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        breaker = %self.name,
                        failures = inner.consecutive_failures,
                        "circuit breaker tripped"
                    );
                    inner.transition(CircuitState::Open, now);
                }
            }
            (CircuitState::HalfOpen, true) => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_max_calls {
                    info!(breaker = %self.name, "circuit breaker closed");
                    inner.transition(CircuitState::Closed, now);
                }
            }
            (CircuitState::HalfOpen, false) => {
                warn!(breaker = %self.name, "trial call failed, circuit breaker reopened");
                inner.transition(CircuitState::Open, now);
            }
            (CircuitState::Open, _) => {}
        }
    }

    /// Give back a half-open slot for a call that ended without an outcome
    fn release(&self, ticket: Ticket) {
        let mut inner = self.inner.lock();
        if ticket.generation == inner.generation
            && inner.state == CircuitState::HalfOpen
            && inner.half_open_admitted > 0
        {
            inner.half_open_admitted -= 1;
        }
    }

    /// Run `f` under the breaker. Caller cancellation is not held against
    /// the upstream; every other error counts as a failure.
    pub async fn call<T, F, Fut>(&self, f: F) -> InsightResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = InsightResult<T>>,
    {
        let ticket = self.allow()?;
        let mut pending = PendingCall {
            breaker: self,
            ticket,
            settled: false,
        };

        let result = f().await;
        match &result {
            Ok(_) => pending.settle(true),
            Err(InsightError::Cancelled) => {}
            Err(_) => pending.settle(false),
        }
        result
    }

    fn refresh(&self, inner: &mut BreakerInner, now: Instant) {
        if inner.state != CircuitState::Open {
            return;
        }
        let cooled = inner
            .opened_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.config.open_timeout);
        if cooled {
            info!(breaker = %self.name, "circuit breaker half-open");
            inner.transition(CircuitState::HalfOpen, now);
        }
    }
}

/// Releases the half-open slot if the call future is dropped before settling
struct PendingCall<'a> {
    breaker: &'a CircuitBreaker,
    ticket: Ticket,
    settled: bool,
}

impl PendingCall<'_> {
    fn settle(&mut self, success: bool) {
        self.settled = true;
        self.breaker.record_result(self.ticket, success);
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.ticket);
        }
    }
}
