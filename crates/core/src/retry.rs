use std::time::Duration;

/// Strategy for spacing retry attempts.
///
/// Used wherever the organizer talks to an external service that can fail
/// transiently: classification calls and watch-channel re-establishment.
/// Computed delays never exceed the configured maximum.
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// Exponential backoff: `base * multiplier^attempt`, optionally with
    /// deterministic jitter.
    Exponential {
        /// Initial delay before the first retry.
        base: Duration,
        /// Upper bound on the computed delay.
        max: Duration,
        /// Factor applied on each successive attempt.
        multiplier: f64,
        /// When `true`, a deterministic jitter factor is applied so that
        /// concurrent callers do not all retry at the same instant.
        jitter: bool,
    },
    /// Constant delay between every retry attempt.
    Constant {
        /// Fixed delay duration.
        delay: Duration,
    },
}

impl RetryStrategy {
    /// Compute the delay duration for the given zero-based `attempt` number.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use docshelf_core::RetryStrategy;
    ///
    /// let strategy = RetryStrategy::Constant { delay: Duration::from_secs(1) };
    /// assert_eq!(strategy.delay_for(0), Duration::from_secs(1));
    /// assert_eq!(strategy.delay_for(5), Duration::from_secs(1));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Exponential {
                base,
                max,
                multiplier,
                jitter,
            } => {
                let base_secs = base.as_secs_f64();
                // In practice `attempt` is a small retry count (< 100), so
                // wrapping from u32 to i32 cannot occur.
                #[allow(clippy::cast_possible_wrap)]
                let raw = base_secs * multiplier.powi(attempt as i32);

                let adjusted = if *jitter {
                    // Deterministic jitter: +0% to +40% keyed off the attempt
                    // number, so no random number generator is needed.
                    raw * (1.0 + 0.1 * f64::from(attempt % 5))
                } else {
                    raw
                };

                Duration::from_secs_f64(adjusted.min(max.as_secs_f64()))
            }
            Self::Constant { delay } => *delay,
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_no_jitter_doubles() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(strategy.delay_for(0), Duration::from_millis(100));
        assert_eq!(strategy.delay_for(1), Duration::from_millis(200));
        assert_eq!(strategy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn exponential_clamped_to_max() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(5),
            multiplier: 3.0,
            jitter: false,
        };
        assert_eq!(strategy.delay_for(2), Duration::from_secs(5));
        assert_eq!(strategy.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn exponential_jitter_is_deterministic() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: true,
        };
        // attempt 1: 200ms * (1.0 + 0.1*1) = 220ms
        assert_eq!(strategy.delay_for(1), Duration::from_millis(220));
        // attempt 5 shares the jitter factor of attempt 0 (5 % 5 == 0)
        assert_eq!(strategy.delay_for(5), Duration::from_millis(3200));
    }

    #[test]
    fn constant_always_same() {
        let strategy = RetryStrategy::Constant {
            delay: Duration::from_millis(250),
        };
        for attempt in 0..10 {
            assert_eq!(strategy.delay_for(attempt), Duration::from_millis(250));
        }
    }
}
