//! The backoff strategy abstraction consulted between attempts.

use std::time::Duration;

/// A strategy deciding how long to wait between attempts and when to give up.
///
/// The retry loop in [`RetryableOperation`](crate::operation::RetryableOperation)
/// calls [`next_delay`](BackoffStrategy::next_delay) after every transient
/// failure. Returning `None` ends the sequence as exhausted.
///
/// # Examples
///
/// ```rust
/// use fibretry::retry::{BackoffStrategy, FibonacciBackoff};
/// use std::time::Duration;
///
/// let backoff = FibonacciBackoff::new(4, 30, Duration::from_millis(10));
///
/// assert_eq!(backoff.next_delay(0), Some(Duration::ZERO));
/// assert_eq!(backoff.next_delay(2), Some(Duration::from_millis(10)));
/// // attempt 3 is the last of 4, nothing follows it
/// assert_eq!(backoff.next_delay(3), None);
/// ```
pub trait BackoffStrategy: Send + Sync {
    /// Calculate the delay to wait after attempt `attempt` (0-indexed) failed
    /// transiently.
    ///
    /// # Returns
    /// - `Some(Duration)`: Wait this long, then run attempt `attempt + 1`
    /// - `None`: `attempt` was the last permitted attempt
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Get the total number of attempts the strategy permits.
    ///
    /// Unlike a retry count this includes the first attempt, so `0` means
    /// the operation is never attempted at all.
    fn max_attempts(&self) -> u32;

    /// Whether another attempt may follow attempt `attempt`.
    ///
    /// Default implementation compares against [`max_attempts`](BackoffStrategy::max_attempts).
    fn has_next(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts()
    }
}
