//! Delay schedule between export status polls.

use std::time::Duration;

/// Delay strategy for the export poller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// The same delay before every poll.
    Fixed { delay: Duration },
    /// `base * factor^attempt`, capped at `max`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        /// Applies random jitter of +/- 50%.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    pub const fn fixed_seconds(seconds: u64) -> Self {
        Self::Fixed {
            delay: Duration::from_secs(seconds),
        }
    }

    /// True when every delay this schedule produces is zero.
    pub fn is_zero(self) -> bool {
        match self {
            Self::Fixed { delay } => delay.is_zero(),
            Self::Exponential { base, max, .. } => base.is_zero() || max.is_zero(),
        }
    }

    /// Delay after the given 0-based poll attempt.
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = base.as_secs_f64() * factor.powi(exponent);
                let capped = if seconds.is_finite() {
                    seconds.min(max.as_secs_f64())
                } else {
                    max.as_secs_f64()
                };
                let delay = Duration::from_secs_f64(capped.max(0.0));

                if !jitter {
                    return delay;
                }

                let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                let spread = millis / 2;
                let offset = fastrand::u64(0..=spread.saturating_mul(2));
                Duration::from_millis(millis.saturating_sub(spread).saturating_add(offset))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backoff_never_changes() {
        let backoff = Backoff::fixed_seconds(1);
        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(7), Duration::from_secs(1));
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(5),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(3), Duration::from_secs(5));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn jitter_stays_within_half_the_delay() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(2),
            factor: 1.0,
            max: Duration::from_secs(2),
            jitter: true,
        };

        for attempt in 0..50 {
            let delay = backoff.delay(attempt);
            assert!(delay >= Duration::from_secs(1), "{delay:?}");
            assert!(delay <= Duration::from_secs(3), "{delay:?}");
        }
    }
}
