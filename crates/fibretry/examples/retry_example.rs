//! Example: Retrying an unreliable call with Fibonacci backoff
//!
//! This example demonstrates:
//! 1. A retryable operation that succeeds after transient failures
//! 2. Classifying `Result`s into solvable / unsolvable outcomes
//! 3. Cancelling an operation while it backs off
//! 4. Fire-and-forget execution
//!
//! Run with:
//! ```bash
//! cargo run -p fibretry --example retry_example
//! ```

use fibretry::prelude::*;
use std::error::Error;
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// A simulated API that fails the first few times
struct UnreliableApi {
    attempts: AtomicU32,
    fail_count: u32,
    failure: ErrorKind,
}

impl UnreliableApi {
    fn new(fail_count: u32, failure: ErrorKind) -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicU32::new(0),
            fail_count,
            failure,
        })
    }

    async fn call(&self) -> Result<String, std::io::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            println!("  Attempt {}: FAILED ({:?})", attempt + 1, self.failure);
            Err(std::io::Error::from(self.failure))
        } else {
            println!("  Attempt {}: SUCCESS", attempt + 1);
            Ok("API response data".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Timeouts are worth retrying, everything else is not.
fn classify(result: Result<String, std::io::Error>) -> AttemptOutcome<String, String> {
    AttemptOutcome::classify(result, |e| e.kind() == ErrorKind::TimedOut).map_err(|e| e.to_string())
}

fn handler_for(api: &Arc<UnreliableApi>) -> impl Handler<String, String> + 'static {
    let api = Arc::clone(api);
    move || {
        let api = Arc::clone(&api);
        async move { classify(api.call().await) }
    }
}

fn policy() -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(6)
        .max_delay(5)
        .priority(Priority::UserInitiated)
        .time_unit(Duration::from_millis(100))
        .build()
}

/// Example 1: Success after transient failures
async fn example_simple_retry() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Retry with Fibonacci Backoff ===\n");

    let api = UnreliableApi::new(3, ErrorKind::TimedOut);
    let operation = RetryableOperation::new(policy(), handler_for(&api))?;

    println!("Calling unreliable API (will time out 3 times before succeeding)...");
    let start = Instant::now();
    operation.start()?;
    let result = operation.wait().await;

    println!("\nResult: {:?}", result);
    println!("Total attempts: {}", api.total_attempts());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 0ms + 100ms + 100ms = ~200ms");

    Ok(())
}

/// Example 2: Non-transient errors are not retried
async fn example_unsolvable() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Unsolvable Errors Stop Immediately ===\n");

    let api = UnreliableApi::new(3, ErrorKind::PermissionDenied);
    let operation = RetryableOperation::new(policy(), handler_for(&api))?;

    operation.subscribe(
        |value| println!("  Unexpected success: {}", value),
        |err| println!("  Gave up without retrying: {}", err),
        || println!("  Unexpectedly exhausted"),
    );
    operation.start()?;
    let result = operation.wait().await;

    assert!(result.is_failed());
    println!("Total attempts: {}", api.total_attempts());

    Ok(())
}

/// Example 3: Cancel while backing off
async fn example_cancel() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Cancellation ===\n");

    let api = UnreliableApi::new(u32::MAX, ErrorKind::TimedOut);
    let operation = RetryableOperation::new(policy(), handler_for(&api))?;

    operation.subscribe_callbacks(
        Callbacks::new().on_cancelled(|| println!("  Operation cancelled")),
    );
    operation.start()?;

    tokio::time::sleep(Duration::from_millis(250)).await;
    println!("State before cancel: {}", operation.state());
    operation.cancel();

    let result = operation.wait().await;
    println!("Result: {:?} after {} attempts", result, operation.attempts());

    Ok(())
}

/// Example 4: Fire-and-forget
async fn example_execute() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 4: Fire-and-Forget ===\n");

    let api = UnreliableApi::new(1, ErrorKind::TimedOut);
    let (tx, rx) = tokio::sync::oneshot::channel();

    execute(
        policy(),
        handler_for(&api),
        move |value| {
            let _ = tx.send(value);
        },
        |err| eprintln!("  Failed: {}", err),
        || eprintln!("  Exhausted"),
    )?;

    println!("Received: {}", rx.await?);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("==============================================");
    println!("   fibretry: Retryable Operation Examples");
    println!("==============================================");

    example_simple_retry().await?;
    example_unsolvable().await?;
    example_cancel().await?;
    example_execute().await?;

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}
