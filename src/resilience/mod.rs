//! Outbound call protection
//!
//! Every upstream call goes through a [`ResilientCaller`], which composes:
//!
//! - [`CircuitBreaker`]: fails fast with `Unavailable` after repeated failures
//! - [`retry_with`]: bounded retry of transient failures with linear backoff
//! - [`RequestContext`]: caller cancellation and deadline, honoured by every
//!   attempt and every backoff sleep
//!
//! ```text
//! call(ctx, op)
//!   └─ breaker.allow() ──open──► Unavailable
//!        └─ attempt 1 ──transient──► sleep 1s ─► attempt 2 ──► sleep 2s ─► attempt 3
//!                                                                            └─► Unavailable
//! ```

mod breaker;
mod caller;
mod clock;
mod context;
mod retry;

pub use breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Ticket};
pub use caller::ResilientCaller;
pub use clock::{Clock, ManualClock, RecordingSleeper, Sleeper, SystemClock, TokioSleeper};
pub use context::RequestContext;
pub use retry::{linear_backoff, retry_with, RetryPolicy};
