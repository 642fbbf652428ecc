//! Back-off arithmetic shared by both retry modes.

use std::time::Duration;

use rand::Rng;

use crate::capability::RateLimitSignal;

/// How the wait before a retry is computed when the server gives no hint.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// `2^attempt + attempt * 0.5` seconds. No jitter.
    Exponential,
    /// A fixed cool-down of `fallback`, followed by a full-jitter draw from
    /// `[0, 2^attempt]` seconds.
    CoolDown { fallback: Duration },
}

/// Retry budget and back-off strategy.
///
/// `max_attempts` bounds the total number of invocations of the unit of work,
/// so at most `max_attempts - 1` waits happen before the last signal is
/// returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::stage()
    }
}

/// One scheduled retry. Lives only for the duration of a retry loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryAttempt {
    /// Zero-based index of the attempt that was throttled.
    pub attempt_number: u32,
    /// Deterministic part of the wait: the server hint or the strategy default.
    pub computed_delay: Duration,
    /// Randomized padding added on top of `computed_delay`.
    pub jitter: Duration,
    pub cause: RateLimitSignal,
}

impl RetryAttempt {
    pub fn wait(&self) -> Duration {
        self.computed_delay + self.jitter
    }
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
    pub const CATEGORY_FALLBACK: Duration = Duration::from_secs(15);

    /// Stage-level variant: exponential growth, no jitter.
    pub fn stage() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Exponential,
        }
    }

    /// Per-category variant: 15 s cool-down plus full jitter.
    pub fn category() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::CoolDown {
                fallback: Self::CATEGORY_FALLBACK,
            },
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Deterministic wait for `attempt`: the hint when present, otherwise the
    /// strategy default.
    pub fn computed_delay(&self, attempt: u32, hint_secs: Option<u64>) -> Duration {
        if let Some(secs) = hint_secs {
            return Duration::from_secs(secs);
        }
        match &self.backoff {
            Backoff::Exponential => {
                let n = f64::from(attempt);
                Duration::from_secs_f64(2f64.powf(n) + n * 0.5)
            }
            Backoff::CoolDown { fallback } => *fallback,
        }
    }

    /// Upper bound of the jitter draw for `attempt`.
    pub fn jitter_ceiling(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::Exponential => Duration::ZERO,
            Backoff::CoolDown { .. } => Duration::from_secs_f64(2f64.powf(f64::from(attempt))),
        }
    }

    /// Decide what to do after `attempt` was throttled.
    ///
    /// Returns `None` once the attempt budget is spent.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        attempt: u32,
        signal: &RateLimitSignal,
        rng: &mut R,
    ) -> Option<RetryAttempt> {
        if attempt.saturating_add(1) >= self.max_attempts {
            return None;
        }

        let computed_delay = self.computed_delay(attempt, signal.retry_after_secs());
        let ceiling = self.jitter_ceiling(attempt).as_secs_f64();
        let jitter = if ceiling > 0.0 {
            Duration::from_secs_f64(rng.gen_range(0.0..=ceiling))
        } else {
            Duration::ZERO
        };

        Some(RetryAttempt {
            attempt_number: attempt,
            computed_delay,
            jitter,
            cause: signal.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_stage_delay_without_hint_follows_formula() {
        let policy = RetryPolicy::stage();
        let expected = [1.0, 2.5, 5.0, 9.5, 18.0];
        for (n, secs) in expected.iter().enumerate() {
            assert_eq!(
                policy.computed_delay(n as u32, None),
                Duration::from_secs_f64(*secs),
                "attempt {n}"
            );
        }
    }

    #[test]
    fn test_hint_overrides_both_variants() {
        assert_eq!(
            RetryPolicy::stage().computed_delay(4, Some(7)),
            Duration::from_secs(7)
        );
        assert_eq!(
            RetryPolicy::category().computed_delay(0, Some(7)),
            Duration::from_secs(7)
        );
    }

    #[test]
    fn test_category_delay_without_hint_is_fifteen_seconds() {
        let policy = RetryPolicy::category();
        for attempt in 0..5 {
            assert_eq!(policy.computed_delay(attempt, None), Duration::from_secs(15));
        }
    }

    #[test]
    fn test_stage_plan_has_no_jitter() {
        let signal = RateLimitSignal::new("quota");
        let step = RetryPolicy::stage().plan(2, &signal, &mut rng()).unwrap();
        assert_eq!(step.jitter, Duration::ZERO);
        assert_eq!(step.wait(), Duration::from_secs(5));
        assert_eq!(step.attempt_number, 2);
    }

    #[test]
    fn test_category_plan_jitter_stays_within_ceiling() {
        let policy = RetryPolicy::category();
        let signal = RateLimitSignal::new("quota");
        let mut rng = rng();
        for attempt in 0..5 {
            let step = policy.plan(attempt, &signal, &mut rng).unwrap();
            assert_eq!(step.computed_delay, Duration::from_secs(15));
            assert!(step.jitter <= policy.jitter_ceiling(attempt));
        }
    }

    #[test]
    fn test_plan_exhausts_after_max_attempts() {
        let policy = RetryPolicy::stage().with_max_attempts(3);
        let signal = RateLimitSignal::new("quota");
        assert!(policy.plan(0, &signal, &mut rng()).is_some());
        assert!(policy.plan(1, &signal, &mut rng()).is_some());
        assert!(policy.plan(2, &signal, &mut rng()).is_none());
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let policy = RetryPolicy::category().with_max_attempts(0);
        assert_eq!(policy.max_attempts, 1);
        assert!(policy
            .plan(0, &RateLimitSignal::new("quota"), &mut rng())
            .is_none());
    }
}
