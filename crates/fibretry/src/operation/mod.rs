//! Cancellable, observable retry operations.
//!
//! A [`RetryableOperation`] owns a handler and a [`RetryPolicy`], and drives
//! the handler through an explicit lifecycle:
//!
//! ```text
//! Ready ──start──▶ Executing ──success / unsolvable / exhausted / cancel──▶ Finished
//!   │                                                                          ▲
//!   └───────────────────────────────cancel────────────────────────────────────┘
//! ```
//!
//! Attempts run strictly one after another on the operation's own task, with
//! Fibonacci backoff between transient failures. The terminal result is
//! recorded once and delivered to every subscriber exactly once; subscribers
//! arriving later get it replayed.
//!
//! # Examples
//!
//! ```rust
//! use fibretry::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(5)
//!     .time_unit(Duration::from_millis(1))
//!     .build();
//!
//! let operation = RetryableOperation::new(policy, || async {
//!     AttemptOutcome::<u32, String>::Success(42)
//! })?;
//!
//! operation.subscribe(
//!     |value| println!("succeeded with {value}"),
//!     |err| eprintln!("failed: {err}"),
//!     || eprintln!("gave up"),
//! );
//! operation.start()?;
//!
//! assert_eq!(operation.wait().await, TerminalResult::Succeeded(42));
//! # Ok(())
//! # }
//! ```

mod callbacks;
mod state;

pub use callbacks::Callbacks;
pub use state::{OperationId, OperationState};

use crate::error::{Result, RetryError};
use crate::handler::Handler;
use crate::outcome::{AttemptOutcome, TerminalResult};
use crate::policy::RetryPolicy;
use crate::retry::BackoffStrategy;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::sync::lock;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// A retry sequence with an explicit lifecycle.
///
/// The handle is cheap to clone; clones observe and control the same
/// operation. Dropping every handle does not stop a started operation.
pub struct RetryableOperation<T, E> {
    inner: Arc<Inner<T, E>>,
}

struct Inner<T, E> {
    id: OperationId,
    policy: RetryPolicy,
    handler: Arc<dyn Handler<T, E>>,
    scheduler: Arc<dyn Scheduler>,
    state: watch::Sender<OperationState>,
    slot: Mutex<Slot<T, E>>,
    cancel: CancellationToken,
    attempts: AtomicU32,
}

/// Terminal result and the subscribers still waiting for it.
struct Slot<T, E> {
    result: Option<TerminalResult<T, E>>,
    subscribers: Vec<Callbacks<T, E>>,
}

impl<T, E> RetryableOperation<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create an operation scheduled on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::NoRuntime`] when called outside a tokio runtime.
    pub fn new(policy: RetryPolicy, handler: impl Handler<T, E> + 'static) -> Result<Self> {
        let scheduler = TokioScheduler::current()?;
        Ok(Self::with_scheduler(policy, handler, Arc::new(scheduler)))
    }

    /// Create an operation on an explicitly provided scheduler.
    pub fn with_scheduler(
        policy: RetryPolicy,
        handler: impl Handler<T, E> + 'static,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let (state, _) = watch::channel(OperationState::Ready);
        Self {
            inner: Arc::new(Inner {
                id: OperationId::new(),
                policy,
                handler: Arc::new(handler),
                scheduler,
                state,
                slot: Mutex::new(Slot {
                    result: None,
                    subscribers: Vec::new(),
                }),
                cancel: CancellationToken::new(),
                attempts: AtomicU32::new(0),
            }),
        }
    }

    /// Unique identifier of this operation.
    pub fn id(&self) -> OperationId {
        self.inner.id
    }

    /// The policy this operation runs under.
    pub fn policy(&self) -> &RetryPolicy {
        &self.inner.policy
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OperationState {
        *self.inner.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn state_changes(&self) -> watch::Receiver<OperationState> {
        self.inner.state.subscribe()
    }

    /// Number of handler invocations completed so far.
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// The terminal result, once the operation has finished.
    pub fn result(&self) -> Option<TerminalResult<T, E>> {
        lock(&self.inner.slot).result.clone()
    }

    /// Start the retry sequence on the operation's scheduler.
    ///
    /// The state becomes [`Executing`](OperationState::Executing) before the
    /// work is handed to the scheduler, so no observer can see `Ready` once a
    /// handler may be running.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::AlreadyStarted`] or [`RetryError::AlreadyFinished`]
    /// if the operation has left the `Ready` state. Such a call has no effect.
    pub fn start(&self) -> Result<()> {
        let mut observed = OperationState::Ready;
        let started = self.inner.state.send_if_modified(|state| {
            observed = *state;
            if *state == OperationState::Ready {
                *state = OperationState::Executing;
                true
            } else {
                false
            }
        });
        if !started {
            let id = self.inner.id.to_string();
            return Err(match observed {
                OperationState::Executing => RetryError::AlreadyStarted(id),
                _ => RetryError::AlreadyFinished(id),
            });
        }

        let priority = self.inner.policy.priority();
        tracing::debug!(operation_id = %self.inner.id, "ready -> executing");

        let span = tracing::debug_span!(
            "retryable_operation",
            operation_id = %self.inner.id,
            priority = %priority,
        );
        // Moved into the task so that dropping it unpolled still finishes.
        let guard = FinishGuard {
            inner: Arc::clone(&self.inner),
        };
        self.inner.scheduler.spawn(
            priority,
            Box::pin(
                async move {
                    let result = guard.inner.run().await;
                    guard.inner.finish(OperationState::Executing, result);
                }
                .instrument(span),
            ),
        );
        Ok(())
    }

    /// Request cancellation.
    ///
    /// - `Ready`: finishes immediately as [`TerminalResult::Cancelled`]; the
    ///   handler is never invoked.
    /// - `Executing`: observed before the next handler invocation or during a
    ///   backoff delay, which is cut short. A handler call already in flight
    ///   runs to completion and its outcome still counts if terminal.
    /// - `Finished`: no effect.
    pub fn cancel(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        self.inner.cancel.cancel();
        if self
            .inner
            .finish(OperationState::Ready, TerminalResult::Cancelled)
        {
            tracing::debug!(operation_id = %self.inner.id, "cancelled before start");
        }
    }

    /// Subscribe to the terminal result with the three classic callbacks.
    ///
    /// Cancellation is reported through `on_exhausted`; use
    /// [`subscribe_callbacks`](Self::subscribe_callbacks) with
    /// [`Callbacks::on_cancelled`] to tell the two apart.
    pub fn subscribe(
        &self,
        on_success: impl FnOnce(T) + Send + 'static,
        on_error: impl FnOnce(E) + Send + 'static,
        on_exhausted: impl FnOnce() + Send + 'static,
    ) {
        self.subscribe_callbacks(
            Callbacks::new()
                .on_success(on_success)
                .on_error(on_error)
                .on_exhausted(on_exhausted),
        );
    }

    /// Subscribe a full set of callbacks.
    ///
    /// If the operation already finished, the matching callback runs
    /// immediately on the calling thread with the recorded result, and a
    /// panic in it reaches the caller. Callbacks delivered on completion run
    /// on the operation's task; a panic there is logged and does not keep
    /// other subscribers from being notified.
    pub fn subscribe_callbacks(&self, callbacks: Callbacks<T, E>) {
        let replay = {
            let mut slot = lock(&self.inner.slot);
            if let Some(result) = slot.result.clone() {
                result
            } else {
                slot.subscribers.push(callbacks);
                return;
            }
        };
        callbacks.deliver(replay);
    }

    /// Wait until the operation finishes and return its result.
    ///
    /// This never returns for an operation that is neither started nor
    /// cancelled.
    pub async fn wait(&self) -> TerminalResult<T, E> {
        let mut changes = self.inner.state.subscribe();
        loop {
            if let Some(result) = self.result() {
                return result;
            }
            // The sender lives in `inner`, which `self` keeps alive.
            if changes.changed().await.is_err() {
                return TerminalResult::Cancelled;
            }
        }
    }
}

impl<T, E> Inner<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// The retry loop. Runs once, on the operation's own task.
    async fn run(&self) -> TerminalResult<T, E> {
        let backoff = self.policy.backoff();
        let max_attempts = backoff.max_attempts();

        for attempt in 0..max_attempts {
            if self.cancel.is_cancelled() {
                tracing::debug!(attempt = attempt + 1, "cancelled before attempt");
                return TerminalResult::Cancelled;
            }

            tracing::debug!(attempt = attempt + 1, max_attempts, "invoking handler");
            let outcome = self.handler.attempt().await;
            self.attempts.fetch_add(1, Ordering::SeqCst);

            match outcome {
                AttemptOutcome::Success(value) => return TerminalResult::Succeeded(value),
                AttemptOutcome::Unsolvable(err) => return TerminalResult::Failed(err),
                AttemptOutcome::Solvable => {
                    let Some(delay) = backoff.next_delay(attempt) else {
                        break;
                    };
                    tracing::debug!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient failure, retrying after backoff",
                    );
                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => {
                            tracing::debug!(attempt = attempt + 1, "cancelled during backoff");
                            return TerminalResult::Cancelled;
                        }
                        () = self.scheduler.sleep(delay) => {}
                    }
                }
            }
        }

        tracing::warn!(max_attempts, "attempt budget exhausted");
        TerminalResult::Exhausted
    }

    /// Move from `from` to `Finished`, fix the result, and notify subscribers.
    ///
    /// Returns `false`, doing nothing, if the state was not `from`.
    fn finish(&self, from: OperationState, result: TerminalResult<T, E>) -> bool {
        debug_assert!(from.can_transition_to(OperationState::Finished));
        let subscribers = {
            let mut slot = lock(&self.slot);
            let finished = self.state.send_if_modified(|state| {
                if *state == from && slot.result.is_none() {
                    *state = OperationState::Finished;
                    true
                } else {
                    false
                }
            });
            if !finished {
                return false;
            }
            slot.result = Some(result.clone());
            std::mem::take(&mut slot.subscribers)
        };

        tracing::info!(
            operation_id = %self.id,
            outcome = result.label(),
            attempts = self.attempts.load(Ordering::SeqCst),
            "{from} -> finished",
        );
        for callbacks in subscribers {
            let delivered =
                panic::catch_unwind(AssertUnwindSafe(|| callbacks.deliver(result.clone())));
            if delivered.is_err() {
                tracing::error!(operation_id = %self.id, "subscriber callback panicked");
            }
        }
        true
    }
}

/// Finishes an operation whose task ends without reaching the end of `run`.
///
/// This happens when the handler panics or when the scheduler drops the task,
/// e.g. because its runtime has shut down. The operation is then reported as
/// [`TerminalResult::Cancelled`].
struct FinishGuard<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Drop for FinishGuard<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn drop(&mut self) {
        let executing = *self.inner.state.borrow() == OperationState::Executing;
        if !executing {
            return;
        }
        self.inner.cancel.cancel();
        if self
            .inner
            .finish(OperationState::Executing, TerminalResult::Cancelled)
        {
            tracing::error!(
                operation_id = %self.inner.id,
                "operation task ended without a result",
            );
        }
    }
}

impl<T, E> Clone for RetryableOperation<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for RetryableOperation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryableOperation")
            .field("id", &self.inner.id)
            .field("state", &*self.inner.state.borrow())
            .field("policy", &self.inner.policy)
            .field("attempts", &self.inner.attempts.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
