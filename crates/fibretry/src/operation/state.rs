//! Operation lifecycle state and identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a [`RetryableOperation`](super::RetryableOperation).
///
/// Transitions only move forward: `Ready → Executing → Finished`, or
/// `Ready → Finished` when an operation is cancelled before it starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// Created, not yet started. The handler has not been invoked.
    #[default]
    Ready,

    /// Started; attempts and backoff delays are in progress.
    Executing,

    /// Terminal. The result is fixed and subscribers have been notified.
    Finished,
}

impl OperationState {
    /// Whether the operation reached its terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: OperationState) -> bool {
        matches!(
            (self, next),
            (Self::Ready, Self::Executing)
                | (Self::Ready, Self::Finished)
                | (Self::Executing, Self::Finished)
        )
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::Executing => "executing",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Unique identifier of an operation, used to correlate log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_monotonic() {
        use OperationState::*;

        assert!(Ready.can_transition_to(Executing));
        assert!(Ready.can_transition_to(Finished));
        assert!(Executing.can_transition_to(Finished));

        assert!(!Executing.can_transition_to(Ready));
        assert!(!Finished.can_transition_to(Ready));
        assert!(!Finished.can_transition_to(Executing));
        assert!(!Ready.can_transition_to(Ready));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(OperationState::default().to_string(), "ready");
        assert_eq!(OperationState::Finished.to_string(), "finished");
        assert!(OperationState::Finished.is_finished());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(OperationId::new(), OperationId::new());
    }
}
