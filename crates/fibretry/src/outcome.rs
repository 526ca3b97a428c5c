//! Attempt and terminal outcomes.
//!
//! A handler reports each attempt as an [`AttemptOutcome`]; the operation
//! folds the sequence of attempts into exactly one [`TerminalResult`].

/// Result of a single handler invocation.
///
/// The three tags drive the retry loop:
///
/// | Outcome          | Meaning                         | Loop action            |
/// |------------------|---------------------------------|------------------------|
/// | `Success(v)`     | the work is done                | stop, `Succeeded(v)`   |
/// | `Unsolvable(e)`  | retrying cannot help            | stop, `Failed(e)`      |
/// | `Solvable`       | transient, worth trying again   | back off, retry        |
///
/// # Examples
///
/// ```rust
/// use fibretry::outcome::AttemptOutcome;
///
/// let outcome: AttemptOutcome<u32, String> = AttemptOutcome::Solvable;
/// assert!(outcome.should_retry());
///
/// let outcome: AttemptOutcome<u32, String> = AttemptOutcome::success(42);
/// assert!(outcome.is_terminal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptOutcome<T, E> {
    /// The attempt succeeded with a value.
    Success(T),

    /// The attempt failed and must not be retried.
    Unsolvable(E),

    /// The attempt failed transiently; retry if the budget allows.
    Solvable,
}

impl<T, E> AttemptOutcome<T, E> {
    /// Create a successful outcome.
    pub fn success(value: T) -> Self {
        Self::Success(value)
    }

    /// Create a non-retryable failure.
    pub fn unsolvable(error: E) -> Self {
        Self::Unsolvable(error)
    }

    /// Create a transient failure.
    pub fn solvable() -> Self {
        Self::Solvable
    }

    /// Classify a plain `Result`.
    ///
    /// `Ok` becomes [`Success`](Self::Success). An `Err` becomes
    /// [`Solvable`](Self::Solvable) when `is_transient` accepts it (the error
    /// value is dropped) and [`Unsolvable`](Self::Unsolvable) otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fibretry::outcome::AttemptOutcome;
    /// use std::io::{Error, ErrorKind};
    ///
    /// let transient = |e: &Error| e.kind() == ErrorKind::TimedOut;
    ///
    /// let timed_out: Result<(), Error> = Err(Error::from(ErrorKind::TimedOut));
    /// assert!(AttemptOutcome::classify(timed_out, transient).should_retry());
    ///
    /// let denied: Result<(), Error> = Err(Error::from(ErrorKind::PermissionDenied));
    /// assert!(AttemptOutcome::classify(denied, transient).is_terminal());
    /// ```
    pub fn classify(result: Result<T, E>, is_transient: impl FnOnce(&E) -> bool) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) if is_transient(&err) => Self::Solvable,
            Err(err) => Self::Unsolvable(err),
        }
    }

    /// Whether this is a [`Success`](Self::Success).
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the outcome ends the retry sequence.
    pub fn is_terminal(&self) -> bool {
        !self.should_retry()
    }

    /// Whether the outcome asks for another attempt.
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Solvable)
    }

    /// Map the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AttemptOutcome<U, E> {
        match self {
            Self::Success(value) => AttemptOutcome::Success(f(value)),
            Self::Unsolvable(err) => AttemptOutcome::Unsolvable(err),
            Self::Solvable => AttemptOutcome::Solvable,
        }
    }

    /// Map the error payload.
    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> AttemptOutcome<T, F> {
        match self {
            Self::Success(value) => AttemptOutcome::Success(value),
            Self::Unsolvable(err) => AttemptOutcome::Unsolvable(f(err)),
            Self::Solvable => AttemptOutcome::Solvable,
        }
    }
}

/// The single, final result of a retryable operation.
///
/// Recorded exactly once when the operation finishes and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalResult<T, E> {
    /// A handler invocation returned [`AttemptOutcome::Success`].
    Succeeded(T),

    /// A handler invocation returned [`AttemptOutcome::Unsolvable`].
    Failed(E),

    /// The attempt budget was consumed by transient failures.
    Exhausted,

    /// The operation was cancelled before reaching another outcome.
    Cancelled,
}

impl<T, E> TerminalResult<T, E> {
    /// Whether the operation succeeded.
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Whether the operation failed unrecoverably.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether the attempt budget ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Whether the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The success value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    /// The unsolvable error, if any.
    pub fn err(self) -> Option<E> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl<T, E> From<AttemptOutcome<T, E>> for Option<TerminalResult<T, E>> {
    /// Terminal attempt outcomes map onto their terminal result; `Solvable`
    /// maps to `None` because it does not end the sequence by itself.
    fn from(outcome: AttemptOutcome<T, E>) -> Self {
        match outcome {
            AttemptOutcome::Success(value) => Some(TerminalResult::Succeeded(value)),
            AttemptOutcome::Unsolvable(err) => Some(TerminalResult::Failed(err)),
            AttemptOutcome::Solvable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_tag() {
        let success: AttemptOutcome<i32, &str> = AttemptOutcome::success(42);
        let unsolvable: AttemptOutcome<i32, &str> = AttemptOutcome::unsolvable("fatal");
        let solvable: AttemptOutcome<i32, &str> = AttemptOutcome::solvable();

        assert!(success.is_success() && success.is_terminal() && !success.should_retry());
        assert!(!unsolvable.is_success() && unsolvable.is_terminal());
        assert!(!solvable.is_success() && solvable.should_retry());
    }

    #[test]
    fn test_classify() {
        let is_transient = |e: &&str| *e == "busy";

        assert_eq!(
            AttemptOutcome::classify(Ok::<_, &str>(1), is_transient),
            AttemptOutcome::Success(1)
        );
        assert_eq!(
            AttemptOutcome::<i32, _>::classify(Err("busy"), is_transient),
            AttemptOutcome::Solvable
        );
        assert_eq!(
            AttemptOutcome::<i32, _>::classify(Err("gone"), is_transient),
            AttemptOutcome::Unsolvable("gone")
        );
    }

    #[test]
    fn test_map_preserves_tag() {
        let outcome: AttemptOutcome<i32, &str> = AttemptOutcome::Success(21);
        assert_eq!(outcome.map(|v| v * 2), AttemptOutcome::Success(42));

        let outcome: AttemptOutcome<i32, &str> = AttemptOutcome::Unsolvable("no");
        assert_eq!(outcome.map_err(str::len), AttemptOutcome::Unsolvable(2));

        let outcome: AttemptOutcome<i32, &str> = AttemptOutcome::Solvable;
        assert_eq!(outcome.map(|v| v + 1), AttemptOutcome::Solvable);
    }

    #[test]
    fn test_terminal_accessors() {
        let result: TerminalResult<i32, &str> = TerminalResult::Succeeded(42);
        assert!(result.is_succeeded());
        assert_eq!(result.label(), "succeeded");
        assert_eq!(result.ok(), Some(42));

        let result: TerminalResult<i32, &str> = TerminalResult::Failed("boom");
        assert!(result.is_failed());
        assert_eq!(result.err(), Some("boom"));
        assert_eq!(result.ok(), None);

        assert!(TerminalResult::<i32, &str>::Exhausted.is_exhausted());
        assert!(TerminalResult::<i32, &str>::Cancelled.is_cancelled());
    }

    #[test]
    fn test_outcome_into_terminal() {
        let terminal: Option<TerminalResult<i32, &str>> = AttemptOutcome::Success(1).into();
        assert_eq!(terminal, Some(TerminalResult::Succeeded(1)));

        let terminal: Option<TerminalResult<i32, &str>> = AttemptOutcome::Solvable.into();
        assert_eq!(terminal, None);
    }
}
