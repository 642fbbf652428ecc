//! Rate-limit aware retry.
//!
//! One retry algorithm ([`RetryPolicy::plan`]) drives two execution modes:
//! [`retry_blocking`] parks the calling thread through a [`Pause`], and
//! [`retry_async`] yields to the tokio scheduler. Only errors that expose a
//! [`RateLimitSignal`](crate::capability::RateLimitSignal) are retried.

pub mod executor;
pub mod hint;
pub mod policy;

pub use executor::{retry_async, retry_blocking, Pause, RetryClassify, ThreadPause};
pub use hint::parse_retry_delay;
pub use policy::{Backoff, RetryAttempt, RetryPolicy};
