//! Global atomic counters for pipeline observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a run).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters: no allocations, no locking.
pub struct Metrics {
    rate_limited: AtomicU64,
    retries_scheduled: AtomicU64,
    retries_exhausted: AtomicU64,
    category_failures: AtomicU64,
    stage_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            rate_limited: AtomicU64::new(0),
            retries_scheduled: AtomicU64::new(0),
            retries_exhausted: AtomicU64::new(0),
            category_failures: AtomicU64::new(0),
            stage_failures: AtomicU64::new(0),
        }
    }

    /// A rate-limit signal was observed.
    pub fn inc_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "rate_limited", "counter incremented");
    }

    /// A retry was scheduled after a back-off.
    pub fn inc_retries(&self) {
        self.retries_scheduled.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "retries_scheduled", "counter incremented");
    }

    /// A retry loop gave up.
    pub fn inc_exhausted(&self) {
        self.retries_exhausted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "retries_exhausted", "counter incremented");
    }

    pub fn inc_category_failures(&self) {
        self.category_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "category_failures", "counter incremented");
    }

    pub fn inc_stage_failures(&self) {
        self.stage_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "stage_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a run) rather than on every
    /// increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            rate_limited = self.rate_limited(),
            retries_scheduled = self.retries_scheduled(),
            retries_exhausted = self.retries_exhausted(),
            category_failures = self.category_failures(),
            stage_failures = self.stage_failures(),
        );
    }

    pub fn rate_limited(&self) -> u64 {
        self.rate_limited.load(Ordering::Relaxed)
    }

    pub fn retries_scheduled(&self) -> u64 {
        self.retries_scheduled.load(Ordering::Relaxed)
    }

    pub fn retries_exhausted(&self) -> u64 {
        self.retries_exhausted.load(Ordering::Relaxed)
    }

    pub fn category_failures(&self) -> u64 {
        self.category_failures.load(Ordering::Relaxed)
    }

    pub fn stage_failures(&self) -> u64 {
        self.stage_failures.load(Ordering::Relaxed)
    }
}
