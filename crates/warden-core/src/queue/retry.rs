//! Retry policy: decides backoff delays.

use std::time::Duration;

/// Exponential backoff between automatic retries of a failed record.
///
/// `delay(n) = base_delay * multiplier^n`, so with the default policy
/// (1s, x2) the wait before retry 1..=5 is 1s, 2s, 4s, 8s, 16s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Growth factor per additional failure.
    pub multiplier: u32,
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, multiplier: u32) -> Self {
        Self {
            base_delay,
            multiplier,
        }
    }

    /// Delays only strictly increase with a non-zero base and a multiplier of at least 2.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.base_delay.is_zero() {
            return Err("backoff base delay must be non-zero");
        }
        if self.multiplier < 2 {
            return Err("backoff multiplier must be at least 2");
        }
        Ok(())
    }

    /// Delay to wait after the `(n + 1)`-th consecutive failure.
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn delay(&self, n: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(n);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}
