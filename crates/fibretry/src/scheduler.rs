//! Work-dispatching facilities operations run on.
//!
//! A retryable operation needs exactly two things from its host: a way to run
//! a unit of work at a priority class, and a timed suspension that does not
//! block the thread it runs on. [`Scheduler`] captures both so the host can be
//! injected:
//!
//! - [`TokioScheduler`] - spawns onto tokio runtimes, optionally one per priority class
//! - [`InlineScheduler`] - runs work synchronously and skips sleeps, for tests

use crate::error::{Result, RetryError};
use crate::policy::Priority;
use crate::sync::lock;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;

/// A facility that runs operations and suspends them between attempts.
#[async_trait]
pub trait Scheduler: Send + Sync + fmt::Debug {
    /// Run `task` to completion at the given priority class.
    ///
    /// The task owns everything it needs; the scheduler is free to run it on
    /// another thread, or (for test schedulers) before returning.
    fn spawn(&self, priority: Priority, task: BoxFuture<'static, ()>);

    /// Suspend the calling task for `duration`.
    ///
    /// Implementations must not block the underlying worker thread.
    async fn sleep(&self, duration: Duration);
}

/// Scheduler backed by tokio runtimes.
///
/// Work is spawned on a default runtime handle. Individual priority classes
/// can be routed to dedicated runtimes with [`with_lane`](Self::with_lane),
/// e.g. to keep background retries off the runtime serving interactive work.
///
/// # Examples
///
/// ```rust
/// use fibretry::policy::Priority;
/// use fibretry::scheduler::TokioScheduler;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let background = tokio::runtime::Builder::new_multi_thread()
///     .worker_threads(1)
///     .enable_all()
///     .build()?;
/// let interactive = tokio::runtime::Builder::new_multi_thread()
///     .enable_all()
///     .build()?;
///
/// let scheduler = TokioScheduler::new(interactive.handle().clone())
///     .with_lane(Priority::Background, background.handle().clone());
/// assert!(scheduler.has_lane(Priority::Background));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    default: Handle,
    lanes: HashMap<Priority, Handle>,
}

impl TokioScheduler {
    /// Create a scheduler spawning on `handle` for every priority class.
    pub fn new(handle: Handle) -> Self {
        Self {
            default: handle,
            lanes: HashMap::new(),
        }
    }

    /// Create a scheduler on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::NoRuntime`] when called outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| RetryError::NoRuntime(e.to_string()))
    }

    /// Route work of `priority` to the runtime behind `handle`.
    pub fn with_lane(mut self, priority: Priority, handle: Handle) -> Self {
        self.lanes.insert(priority, handle);
        self
    }

    /// Whether `priority` has a dedicated runtime.
    pub fn has_lane(&self, priority: Priority) -> bool {
        self.lanes.contains_key(&priority)
    }

    /// The runtime handle work of `priority` is spawned on.
    pub fn handle_for(&self, priority: Priority) -> &Handle {
        self.lanes.get(&priority).unwrap_or(&self.default)
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    fn spawn(&self, priority: Priority, task: BoxFuture<'static, ()>) {
        // Detached: completion is reported through the operation, not the JoinHandle.
        drop(self.handle_for(priority).spawn(task));
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic scheduler that runs work on the calling thread.
///
/// [`spawn`](Scheduler::spawn) drives the task to completion before
/// returning, and [`sleep`](Scheduler::sleep) returns immediately after
/// recording the requested duration. Handlers used with it must not rely on
/// a tokio reactor (timers, sockets), since no runtime drives the task.
#[derive(Debug, Default)]
pub struct InlineScheduler {
    delays: Mutex<Vec<Duration>>,
    priorities: Mutex<Vec<Priority>>,
}

impl InlineScheduler {
    /// Create an inline scheduler with empty recordings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration passed to `sleep`, in order.
    pub fn recorded_delays(&self) -> Vec<Duration> {
        lock(&self.delays).clone()
    }

    /// The priority class of every spawned task, in order.
    pub fn recorded_priorities(&self) -> Vec<Priority> {
        lock(&self.priorities).clone()
    }
}

#[async_trait]
impl Scheduler for InlineScheduler {
    fn spawn(&self, priority: Priority, task: BoxFuture<'static, ()>) {
        lock(&self.priorities).push(priority);
        futures::executor::block_on(task);
    }

    async fn sleep(&self, duration: Duration) {
        lock(&self.delays).push(duration);
    }
}
