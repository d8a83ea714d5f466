//! # Fibonacci Backoff
//!
//! Requeue delays for failed Shoot reconciliations. The delay grows along the
//! Fibonacci sequence, more slowly than exponential backoff, so a pool whose
//! extension is briefly unavailable is retried quickly while a broken one
//! settles at the cap.
//!
//! Sequence with the defaults: 15s, 15s, 30s, 45s, 75s, 120s, 195s, 300s (max).

use std::time::Duration;

/// Fibonacci backoff calculator in seconds.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Minimum backoff in seconds (for reset)
    min_seconds: u64,
    /// Previous backoff in seconds
    prev_seconds: u64,
    /// Current backoff in seconds
    current_seconds: u64,
    /// Maximum backoff in seconds
    max_seconds: u64,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff between `min_seconds` and `max_seconds`.
    ///
    /// The first two values are both `min_seconds`.
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            min_seconds,
            prev_seconds: 0,
            current_seconds: min_seconds,
            max_seconds,
        }
    }

    /// Get the next backoff duration and advance the sequence.
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current_seconds;

        let next = self.prev_seconds + self.current_seconds;
        self.prev_seconds = self.current_seconds;
        self.current_seconds = std::cmp::min(next, self.max_seconds);

        Duration::from_secs(result)
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev_seconds = 0;
        self.current_seconds = self.min_seconds;
    }
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(15, 300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(backoff: &mut FibonacciBackoff) -> u64 {
        backoff.next_backoff().as_secs()
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::default();

        assert_eq!(secs(&mut backoff), 15);
        assert_eq!(secs(&mut backoff), 15);
        assert_eq!(secs(&mut backoff), 30);
        assert_eq!(secs(&mut backoff), 45);
        assert_eq!(secs(&mut backoff), 75);
        assert_eq!(secs(&mut backoff), 120);
        assert_eq!(secs(&mut backoff), 195);
        assert_eq!(secs(&mut backoff), 300); // max
        assert_eq!(secs(&mut backoff), 300);
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(1, 10);

        assert_eq!(secs(&mut backoff), 1);
        assert_eq!(secs(&mut backoff), 1);
        assert_eq!(secs(&mut backoff), 2);
        assert_eq!(secs(&mut backoff), 3);

        backoff.reset();

        // Should restart from beginning after success
        assert_eq!(secs(&mut backoff), 1);
        assert_eq!(secs(&mut backoff), 1);
        assert_eq!(secs(&mut backoff), 2);
    }
}
