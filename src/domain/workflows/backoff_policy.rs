use rand::Rng;
use time::Duration;

/// Exponential backoff with symmetric multiplicative jitter.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub cap_ms: u64,
    pub jitter_ratio: f64,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, cap_ms: u64, jitter_ratio: f64) -> Self {
        Self {
            base_ms,
            cap_ms,
            jitter_ratio: jitter_ratio.clamp(0.0, 1.0),
        }
    }

    /// Delay before the next attempt, given how many retries have been consumed.
    pub fn delay(&self, retry_count: u32) -> Duration {
        let factor = if self.jitter_ratio > 0.0 {
            rand::thread_rng().gen_range(-self.jitter_ratio..=self.jitter_ratio)
        } else {
            0.0
        };
        self.delay_with_jitter(retry_count, factor)
    }

    /// Deterministic form of [`delay`](Self::delay) for a chosen jitter factor.
    pub fn delay_with_jitter(&self, retry_count: u32, factor: f64) -> Duration {
        // Step 1: Exponential growth, saturating instead of overflowing.
        let raw = self
            .base_ms
            .saturating_mul(2_u64.saturating_pow(retry_count));

        // Step 2: Cap before jitter so the spread stays around the ceiling.
        let capped = raw.min(self.cap_ms) as f64;

        // Step 3: Apply jitter and never go negative.
        let factor = factor.clamp(-self.jitter_ratio, self.jitter_ratio);
        let jittered = (capped * (1.0 + factor)).max(0.0);
        Duration::milliseconds(jittered.round() as i64)
    }

    /// Un-jittered delay for a retry count.
    pub fn nominal_ms(&self, retry_count: u32) -> u64 {
        self.base_ms
            .saturating_mul(2_u64.saturating_pow(retry_count))
            .min(self.cap_ms)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_ms: 1_000,
            cap_ms: 3_600_000,
            jitter_ratio: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BackoffPolicy;

    #[test]
    fn given_zero_jitter_when_delay_should_double_per_retry() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_with_jitter(0, 0.0).whole_milliseconds(), 1_000);
        assert_eq!(policy.delay_with_jitter(1, 0.0).whole_milliseconds(), 2_000);
        assert_eq!(policy.delay_with_jitter(4, 0.0).whole_milliseconds(), 16_000);
    }

    #[test]
    fn given_large_retry_count_when_delay_should_cap_at_one_hour() {
        let policy = BackoffPolicy::default();
        assert_eq!(
            policy.delay_with_jitter(20, 0.0).whole_milliseconds(),
            3_600_000
        );
        assert_eq!(
            policy.delay_with_jitter(200, 0.0).whole_milliseconds(),
            3_600_000
        );
    }

    #[test]
    fn given_extreme_jitter_factors_when_delay_should_stay_within_thirty_percent() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_with_jitter(0, -0.3).whole_milliseconds(), 700);
        assert_eq!(policy.delay_with_jitter(0, 0.3).whole_milliseconds(), 1_300);
        // out-of-range factors are clamped to the configured ratio
        assert_eq!(policy.delay_with_jitter(0, -5.0).whole_milliseconds(), 700);
    }

    #[test]
    fn given_random_jitter_when_delay_for_retries_zero_to_twenty_should_stay_in_bounds() {
        let policy = BackoffPolicy::default();
        for retry in 0..=20 {
            let nominal = policy.nominal_ms(retry) as f64;
            for _ in 0..50 {
                let delay = policy.delay(retry).whole_milliseconds() as f64;
                assert!(delay >= 0.0);
                assert!(delay >= (nominal * 0.7).floor(), "retry {retry}: {delay}");
                assert!(delay <= (nominal * 1.3).ceil(), "retry {retry}: {delay}");
            }
        }
    }
}
