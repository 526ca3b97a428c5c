//! Backoff delay computation.
//!
//! This module provides the delay sequence used between attempts of a
//! [`RetryableOperation`](crate::operation::RetryableOperation): a
//! deterministic, capped Fibonacci progression without jitter.
//!
//! # Key Types
//!
//! - [`delay`] - Pure delay function, in abstract time units
//! - [`BackoffStrategy`] - Trait consulted by the retry loop between attempts
//! - [`FibonacciBackoff`] - Fibonacci implementation bounded by an attempt budget
//!
//! # Examples
//!
//! ```rust
//! use fibretry::retry::{BackoffStrategy, FibonacciBackoff};
//! use std::time::Duration;
//!
//! let backoff = FibonacciBackoff::new(10, 30, Duration::from_secs(1));
//!
//! assert_eq!(backoff.next_delay(6), Some(Duration::from_secs(8)));
//! assert_eq!(backoff.next_delay(9), None);
//! ```

pub mod fibonacci;
mod strategy;

pub use fibonacci::{FibonacciBackoff, delay};
pub use strategy::BackoffStrategy;
