//! Error types for the retry machinery.
//!
//! These cover misuse of an operation's lifecycle, a missing runtime, and
//! invalid configuration. Failures of the wrapped work itself are never
//! represented here: they travel as opaque payloads inside
//! [`AttemptOutcome::Unsolvable`](crate::outcome::AttemptOutcome::Unsolvable).

/// Result type for retry operations
pub type Result<T> = std::result::Result<T, RetryError>;

/// Errors that can occur while configuring or driving a retryable operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    /// `start` was called on an operation that is already executing
    #[error("operation {0} is already executing")]
    AlreadyStarted(String),

    /// `start` was called on an operation that has already finished
    #[error("operation {0} has already finished")]
    AlreadyFinished(String),

    /// No tokio runtime was available to schedule work on
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    /// A configuration value could not be interpreted
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidConfig {
        /// Configuration key (environment variable name)
        key: String,
        /// The rejected raw value
        value: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl RetryError {
    /// Build an [`RetryError::InvalidConfig`] error.
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error reports a lifecycle violation (double start).
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::AlreadyStarted(_) | Self::AlreadyFinished(_))
    }
}
