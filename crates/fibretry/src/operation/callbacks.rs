//! Terminal-result callbacks.

use crate::outcome::TerminalResult;
use std::fmt;

type Callback<A> = Box<dyn FnOnce(A) + Send>;
type Notify = Box<dyn FnOnce() + Send>;

/// One subscriber's set of terminal callbacks.
///
/// Exactly one callback fires per subscriber, exactly once. Unset callbacks
/// default to no-ops. Cancellation is reported to `on_cancelled` when one is
/// set and to `on_exhausted` otherwise, so a subscriber that only knows the
/// three classic outcomes still hears about it.
///
/// # Examples
///
/// ```rust
/// use fibretry::operation::Callbacks;
///
/// let callbacks = Callbacks::<u32, String>::new()
///     .on_success(|value| println!("got {value}"))
///     .on_error(|err| eprintln!("gave up: {err}"))
///     .on_cancelled(|| println!("cancelled"));
/// ```
pub struct Callbacks<T, E> {
    on_success: Callback<T>,
    on_error: Callback<E>,
    on_exhausted: Notify,
    on_cancelled: Option<Notify>,
}

impl<T, E> Callbacks<T, E> {
    /// Create callbacks that ignore every outcome.
    pub fn new() -> Self {
        Self {
            on_success: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
            on_exhausted: Box::new(|| {}),
            on_cancelled: None,
        }
    }

    /// Called with the value of a successful attempt.
    pub fn on_success(mut self, f: impl FnOnce(T) + Send + 'static) -> Self {
        self.on_success = Box::new(f);
        self
    }

    /// Called with the error of an unsolvable attempt, verbatim.
    pub fn on_error(mut self, f: impl FnOnce(E) + Send + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }

    /// Called when the attempt budget is used up.
    pub fn on_exhausted(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_exhausted = Box::new(f);
        self
    }

    /// Called when the operation is cancelled.
    pub fn on_cancelled(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancelled = Some(Box::new(f));
        self
    }

    pub(crate) fn deliver(self, result: TerminalResult<T, E>) {
        match result {
            TerminalResult::Succeeded(value) => (self.on_success)(value),
            TerminalResult::Failed(err) => (self.on_error)(err),
            TerminalResult::Exhausted => (self.on_exhausted)(),
            TerminalResult::Cancelled => match self.on_cancelled {
                Some(on_cancelled) => on_cancelled(),
                None => (self.on_exhausted)(),
            },
        }
    }
}

impl<T, E> Default for Callbacks<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Callbacks<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_cancelled", &self.on_cancelled.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording() -> (Arc<Mutex<Vec<String>>>, Callbacks<i32, String>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let callbacks = Callbacks::new()
            .on_success(move |v| a.lock().unwrap().push(format!("success:{v}")))
            .on_error(move |e| b.lock().unwrap().push(format!("error:{e}")))
            .on_exhausted(move || c.lock().unwrap().push("exhausted".to_string()));
        (log, callbacks)
    }

    #[test]
    fn test_each_result_routes_to_one_callback() {
        let cases = [
            (TerminalResult::Succeeded(42), "success:42"),
            (TerminalResult::Failed("boom".to_string()), "error:boom"),
            (TerminalResult::Exhausted, "exhausted"),
        ];

        for (result, expected) in cases {
            let (log, callbacks) = recording();
            callbacks.deliver(result);
            assert_eq!(*log.lock().unwrap(), vec![expected.to_string()]);
        }
    }

    #[test]
    fn test_cancelled_falls_back_to_exhausted() {
        let (log, callbacks) = recording();
        callbacks.deliver(TerminalResult::Cancelled);
        assert_eq!(*log.lock().unwrap(), vec!["exhausted".to_string()]);
    }

    #[test]
    fn test_cancelled_prefers_dedicated_callback() {
        let (log, callbacks) = recording();
        let cancelled = Arc::clone(&log);
        let callbacks =
            callbacks.on_cancelled(move || cancelled.lock().unwrap().push("cancelled".into()));

        callbacks.deliver(TerminalResult::Cancelled);
        assert_eq!(*log.lock().unwrap(), vec!["cancelled".to_string()]);
    }

    #[test]
    fn test_defaults_are_no_ops() {
        Callbacks::<i32, String>::default().deliver(TerminalResult::Succeeded(1));
        Callbacks::<i32, String>::default().deliver(TerminalResult::Cancelled);
    }
}
