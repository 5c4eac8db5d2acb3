//! Retry policy for conflicting updates
//!
//! Delay before retry `n` (1-based) is
//! `min(base * 2^(n-1), max_delay) + jitter`, with jitter drawn uniformly
//! from `[0, jitter]` so callers contending on one record spread out.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with a ceiling and additive jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry, before jitter
    pub base_delay: Duration,
    /// Ceiling on the exponential part
    pub max_delay: Duration,
    /// Upper bound of the random term
    pub jitter: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(1000),
            jitter: Duration::from_millis(50),
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    /// Deterministic part of the delay before retry `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Delay before retry `attempt` with a caller-supplied jitter sample
    pub fn delay_for(&self, attempt: u32, jitter_sample: Duration) -> Duration {
        self.backoff(attempt) + jitter_sample.min(self.jitter)
    }

    /// Delay before retry `attempt` with random jitter
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let sample = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        self.delay_for(attempt, sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            jitter: Duration::from_millis(5),
            max_retries: 6,
        }
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let p = policy();
        assert_eq!(p.backoff(1), Duration::from_millis(10));
        assert_eq!(p.backoff(2), Duration::from_millis(20));
        assert_eq!(p.backoff(3), Duration::from_millis(40));
        assert_eq!(p.backoff(4), Duration::from_millis(80));
        assert_eq!(p.backoff(5), Duration::from_millis(100));
        assert_eq!(p.backoff(60), Duration::from_millis(100));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let p = policy();
        assert_eq!(
            p.delay_for(1, Duration::from_millis(3)),
            Duration::from_millis(13)
        );
        assert_eq!(
            p.delay_for(1, Duration::from_secs(10)),
            Duration::from_millis(15)
        );

        for attempt in 1..=6 {
            let delay = p.next_delay(attempt);
            assert!(delay >= p.backoff(attempt));
            assert!(delay <= p.backoff(attempt) + p.jitter);
        }
    }

    #[test]
    fn test_zero_jitter() {
        let p = RetryPolicy {
            jitter: Duration::ZERO,
            ..policy()
        };
        assert_eq!(p.next_delay(2), Duration::from_millis(20));
    }
}
