use std::time::Duration;

/// Exponential backoff with multiplicative jitter, capped at `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: f64,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter: 0.0,
        }
    }

    /// `jitter` is clamped to `[0, 1)`; a value of 0.25 spreads delays over
    /// 75%..125% of the nominal delay. NaN and infinities disable jitter.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = match jitter.is_finite() {
            true => jitter.clamp(0.0, 0.99),
            false => 0.0,
        };
        self
    }

    /// Nominal delay for the given attempt (0-based), before jitter.
    pub fn nominal(&self, attempt: u32) -> Duration {
        // 2^20 seconds is already far past any sensible cap
        let factor = 2u32.saturating_pow(attempt.min(20));
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let nominal = self.nominal(attempt);
        if self.jitter < f64::EPSILON {
            return nominal;
        }

        let factor = rand::random_range((1.0 - self.jitter)..(1.0 + self.jitter));
        nominal.mul_f64(factor).min(self.max)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60)).with_jitter(0.25)
    }
}
