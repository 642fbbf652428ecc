//! Blocking and suspendable retry drivers.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::capability::{CapabilityError, RateLimitSignal};
use crate::metrics::METRICS;
use crate::retry::policy::RetryPolicy;

/// Classifies an error as a rate-limit signal (retryable) or not.
pub trait RetryClassify {
    fn rate_limit(&self) -> Option<&RateLimitSignal>;
}

impl RetryClassify for CapabilityError {
    fn rate_limit(&self) -> Option<&RateLimitSignal> {
        match self {
            CapabilityError::RateLimited(signal) => Some(signal),
            _ => None,
        }
    }
}

/// Blocking wait primitive.
pub trait Pause: Send + Sync {
    fn pause(&self, duration: Duration);
}

/// Parks the current thread with `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Shared failure handling: `Ok(wait)` to retry after `wait`, `Err(err)` to
/// surface the error unchanged.
fn next_wait<E>(policy: &RetryPolicy, label: &str, attempt: u32, err: E) -> Result<Duration, E>
where
    E: RetryClassify + Display,
{
    let Some(signal) = err.rate_limit() else {
        return Err(err);
    };
    METRICS.inc_rate_limited();

    let step = policy.plan(attempt, signal, &mut rand::thread_rng());
    match step {
        Some(step) => {
            warn!(
                task = %label,
                attempt = attempt + 1,
                delay_secs = step.wait().as_secs_f64(),
                hinted = signal.retry_after_secs().is_some(),
                "rate limit hit, retrying"
            );
            METRICS.inc_retries();
            Ok(step.wait())
        }
        None => {
            error!(task = %label, attempts = attempt + 1, error = %err, "retries exhausted");
            METRICS.inc_exhausted();
            Err(err)
        }
    }
}

/// Run `op` until it succeeds, fails with a non-rate-limit error, or the
/// attempt budget runs out. Waits go through `pause` on the calling thread.
///
/// `op` receives the zero-based attempt index.
pub fn retry_blocking<T, E, F>(
    policy: &RetryPolicy,
    label: &str,
    pause: &dyn Pause,
    mut op: F,
) -> Result<T, E>
where
    E: RetryClassify + Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => {
                let wait = next_wait(policy, label, attempt, err)?;
                pause.pause(wait);
                attempt += 1;
            }
        }
    }
}

/// Suspendable counterpart of [`retry_blocking`]; waits with
/// `tokio::time::sleep` so no worker thread is held.
pub async fn retry_async<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    E: RetryClassify + Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let wait = next_wait(policy, label, attempt, err)?;
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
