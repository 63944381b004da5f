/// Jobs per minute over a window. Empty or zero-length windows yield zero.
pub fn throughput_per_minute(completed: u64, window_minutes: u64) -> f64 {
    if window_minutes == 0 {
        return 0.0;
    }
    completed as f64 / window_minutes as f64
}

/// Fraction of successful attempts in `[0, 1]`; zero when nothing was attempted.
pub fn success_rate(successes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (successes.min(total)) as f64 / total as f64
}

/// Round to two decimals for presentation.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_window_when_computing_rates_should_return_zero() {
        assert_eq!(throughput_per_minute(0, 60), 0.0);
        assert_eq!(throughput_per_minute(10, 0), 0.0);
        assert_eq!(success_rate(0, 0), 0.0);
    }

    #[test]
    fn given_counts_when_computing_rates_should_divide() {
        assert_eq!(throughput_per_minute(120, 60), 2.0);
        assert_eq!(success_rate(3, 4), 0.75);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(f64::NAN), 0.0);
    }
}
