//! Fire-and-forget entry points.
//!
//! [`execute`] runs the same retry loop as a [`RetryableOperation`] without
//! handing the caller an operation handle: it builds the operation,
//! subscribes the callbacks, starts it, and lets go. Use it when nothing
//! needs to cancel, observe, or re-subscribe.

use crate::error::Result;
use crate::handler::Handler;
use crate::operation::RetryableOperation;
use crate::policy::RetryPolicy;
use crate::scheduler::{Scheduler, TokioScheduler};
use std::sync::Arc;

/// Retry `handler` under `policy` on the current tokio runtime.
///
/// Exactly one of the callbacks fires, exactly once, on the task running the
/// retries.
///
/// # Errors
///
/// Returns [`RetryError::NoRuntime`](crate::error::RetryError::NoRuntime)
/// when called outside a tokio runtime; the handler is not invoked then.
///
/// # Examples
///
/// ```rust
/// use fibretry::executor::execute;
/// use fibretry::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (tx, rx) = tokio::sync::oneshot::channel();
///
/// execute(
///     RetryPolicy::default(),
///     || async { AttemptOutcome::<&str, String>::Success("pong") },
///     move |reply| {
///         let _ = tx.send(reply);
///     },
///     |err| eprintln!("ping failed: {err}"),
///     || eprintln!("ping gave up"),
/// )?;
///
/// assert_eq!(rx.await?, "pong");
/// # Ok(())
/// # }
/// ```
pub fn execute<T, E>(
    policy: RetryPolicy,
    handler: impl Handler<T, E> + 'static,
    on_success: impl FnOnce(T) + Send + 'static,
    on_error: impl FnOnce(E) + Send + 'static,
    on_exhausted: impl FnOnce() + Send + 'static,
) -> Result<()>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let scheduler = TokioScheduler::current()?;
    execute_on(
        Arc::new(scheduler),
        policy,
        handler,
        on_success,
        on_error,
        on_exhausted,
    );
    Ok(())
}

/// Retry `handler` under `policy` on an explicitly provided scheduler.
///
/// Behaves exactly like [`execute`] apart from where the work runs.
pub fn execute_on<T, E>(
    scheduler: Arc<dyn Scheduler>,
    policy: RetryPolicy,
    handler: impl Handler<T, E> + 'static,
    on_success: impl FnOnce(T) + Send + 'static,
    on_error: impl FnOnce(E) + Send + 'static,
    on_exhausted: impl FnOnce() + Send + 'static,
) where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let operation = RetryableOperation::with_scheduler(policy, handler, scheduler);
    tracing::debug!(operation_id = %operation.id(), "executing detached operation");
    operation.subscribe(on_success, on_error, on_exhausted);
    if let Err(err) = operation.start() {
        // A fresh operation is always Ready.
        tracing::error!(error = %err, "detached operation failed to start");
    }
}
