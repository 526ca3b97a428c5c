#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Cancellable retry operations with capped Fibonacci backoff.
//!
//! This crate retries a fallible asynchronous handler until it succeeds,
//! fails unrecoverably, or uses up its attempt budget:
//!
//! - **Three-way attempt outcomes** via [`AttemptOutcome`](outcome::AttemptOutcome)
//!   - `Success(value)` stops with the value
//!   - `Unsolvable(error)` stops without retrying
//!   - `Solvable` backs off and tries again
//! - **Deterministic backoff** via [`retry::delay`]: `0, 1, 1, 2, 3, 5, 8, …`
//!   time units, capped, without jitter
//! - **Explicit lifecycle** via [`RetryableOperation`](operation::RetryableOperation):
//!   `Ready → Executing → Finished`, observable, cancellable, with exactly one
//!   terminal callback per subscriber
//! - **Injected scheduling** via [`Scheduler`](scheduler::Scheduler), so tests
//!   can swap the tokio runtime for a synchronous one
//! - **Fire-and-forget** via [`executor::execute`]
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use fibretry::prelude::*;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let calls = Arc::new(AtomicU32::new(0));
//! let counter = Arc::clone(&calls);
//!
//! let policy = RetryPolicy::builder()
//!     .max_attempts(5)
//!     .time_unit(Duration::from_millis(10))
//!     .build();
//!
//! let operation = RetryableOperation::new(policy, move || {
//!     let counter = Arc::clone(&counter);
//!     async move {
//!         if counter.fetch_add(1, Ordering::SeqCst) < 2 {
//!             AttemptOutcome::Solvable
//!         } else {
//!             AttemptOutcome::<u32, String>::Success(42)
//!         }
//!     }
//! })?;
//! operation.start()?;
//!
//! assert_eq!(operation.wait().await, TerminalResult::Succeeded(42));
//! assert_eq!(calls.load(Ordering::SeqCst), 3);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod executor;
pub mod handler;
pub mod operation;
pub mod outcome;
pub mod policy;
pub mod retry;
pub mod scheduler;
mod sync;

/// Convenient re-exports of commonly used items.
///
/// Import everything needed to build and run operations with:
///
/// ```rust
/// use fibretry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::RetryError;
    pub use crate::executor::{execute, execute_on};
    pub use crate::handler::Handler;
    pub use crate::operation::{Callbacks, OperationId, OperationState, RetryableOperation};
    pub use crate::outcome::{AttemptOutcome, TerminalResult};
    pub use crate::policy::{Priority, RetryPolicy, RetryPolicyBuilder};
    pub use crate::retry::{BackoffStrategy, FibonacciBackoff};
    pub use crate::scheduler::{InlineScheduler, Scheduler, TokioScheduler};
}
