//! The unit of work a retryable operation invokes.

use crate::outcome::AttemptOutcome;
use async_trait::async_trait;
use std::future::Future;

/// Work performed once per attempt.
///
/// A handler is invoked repeatedly through `&self`, never concurrently for
/// the same operation: each invocation completes before the next begins.
/// Any per-attempt state must therefore live behind interior mutability.
///
/// Closures returning a future of [`AttemptOutcome`] implement this trait,
/// which covers most uses:
///
/// ```rust
/// use fibretry::handler::Handler;
/// use fibretry::outcome::AttemptOutcome;
///
/// # async fn example() {
/// let handler = || async { AttemptOutcome::<u32, String>::Success(42) };
/// assert_eq!(handler.attempt().await, AttemptOutcome::Success(42));
/// # }
/// ```
///
/// Types with their own state can implement it directly:
///
/// ```rust
/// use async_trait::async_trait;
/// use fibretry::handler::Handler;
/// use fibretry::outcome::AttemptOutcome;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// struct Flaky {
///     calls: AtomicU32,
/// }
///
/// #[async_trait]
/// impl Handler<u32, String> for Flaky {
///     async fn attempt(&self) -> AttemptOutcome<u32, String> {
///         match self.calls.fetch_add(1, Ordering::SeqCst) {
///             0 | 1 => AttemptOutcome::Solvable,
///             n => AttemptOutcome::Success(n),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T, E>: Send + Sync {
    /// Perform one attempt and classify its result.
    async fn attempt(&self) -> AttemptOutcome<T, E>;
}

#[async_trait]
impl<F, Fut, T, E> Handler<T, E> for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = AttemptOutcome<T, E>> + Send,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn attempt(&self) -> AttemptOutcome<T, E> {
        (self)().await
    }
}
