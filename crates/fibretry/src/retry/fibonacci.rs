//! Capped Fibonacci backoff.

use super::strategy::BackoffStrategy;
use std::time::Duration;

/// Compute the backoff delay, in time units, after attempt `attempt_index`.
///
/// The delay follows the Fibonacci sequence `F[0]=0, F[1]=1, F[i]=F[i-1]+F[i-2]`
/// capped at `max_delay`. There is no jitter: the same arguments always give
/// the same delay, whatever was computed before.
///
/// # Mathematical Formula
///
/// ```text
/// delay(i) = 0                     if max_attempts <= 1
/// delay(i) = min(F[i], max_delay)  otherwise
/// ```
///
/// With `max_attempts = 10` and `max_delay = 30` this yields
/// `0, 1, 1, 2, 3, 5, 8, 13, 21, 30` for `i = 0..9`.
///
/// `attempt_index` must lie in `[0, max_attempts)`; the retry loop stops
/// before it could ask for anything else.
///
/// # Examples
///
/// ```rust
/// use fibretry::retry::delay;
///
/// let delays: Vec<u64> = (0..10).map(|i| delay(i, 10, 30)).collect();
/// assert_eq!(delays, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 30]);
///
/// assert_eq!(delay(0, 1, 30), 0);
/// ```
pub fn delay(attempt_index: u32, max_attempts: u32, max_delay: u64) -> u64 {
    if max_attempts <= 1 {
        return 0;
    }
    debug_assert!(
        attempt_index < max_attempts,
        "attempt index {attempt_index} out of range for {max_attempts} attempts"
    );

    let (mut current, mut next) = (0u64, 1u64);
    for _ in 0..attempt_index {
        // The sequence never decreases, so once the cap is hit it stays hit.
        if current >= max_delay {
            return max_delay;
        }
        let sum = current.saturating_add(next);
        current = next;
        next = sum;
    }
    current.min(max_delay)
}

/// Fibonacci backoff strategy bounded by an attempt budget.
///
/// Delays are expressed in abstract time units (see [`delay`]) and turned
/// into wall-clock durations by multiplying with `time_unit`.
///
/// # Performance Characteristics
///
/// - **Memory**: O(1) - the sequence is recomputed, never stored
/// - **CPU**: O(min(attempt, k)) per delay, where `F[k]` is the first value at the cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FibonacciBackoff {
    max_attempts: u32,
    max_delay: u64,
    time_unit: Duration,
}

impl FibonacciBackoff {
    /// Create a backoff permitting `max_attempts` attempts, with delays capped
    /// at `max_delay` units of `time_unit` each.
    pub fn new(max_attempts: u32, max_delay: u64, time_unit: Duration) -> Self {
        Self {
            max_attempts,
            max_delay,
            time_unit,
        }
    }

    /// The delay cap, in time units.
    pub fn max_delay(&self) -> u64 {
        self.max_delay
    }

    /// Duration of one time unit.
    pub fn time_unit(&self) -> Duration {
        self.time_unit
    }

    /// Delay after `attempt` in time units, without the attempt-budget check.
    pub fn delay_units(&self, attempt: u32) -> u64 {
        delay(attempt, self.max_attempts, self.max_delay)
    }

    fn to_duration(&self, units: u64) -> Duration {
        self.time_unit
            .saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
    }
}

impl BackoffStrategy for FibonacciBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.has_next(attempt) {
            return None;
        }
        Some(self.to_duration(self.delay_units(attempt)))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
