//! Retry policy configuration.
//!
//! A [`RetryPolicy`] bundles the attempt budget, the delay cap, the priority
//! class operations are scheduled at, and the length of one delay unit. It is
//! plain data: cheap to copy, serializable, and loadable from the environment.

use crate::error::{Result, RetryError};
use crate::retry::FibonacciBackoff;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default total number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay cap, in time units.
pub const DEFAULT_MAX_DELAY: u64 = 30;

/// Default length of one delay time unit.
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

/// Environment variable overriding [`RetryPolicy::max_attempts`].
pub const ENV_MAX_ATTEMPTS: &str = "FIBRETRY_MAX_ATTEMPTS";
/// Environment variable overriding [`RetryPolicy::max_delay`].
pub const ENV_MAX_DELAY: &str = "FIBRETRY_MAX_DELAY";
/// Environment variable overriding [`RetryPolicy::priority`].
pub const ENV_PRIORITY: &str = "FIBRETRY_PRIORITY";
/// Environment variable overriding [`RetryPolicy::time_unit`], in milliseconds.
pub const ENV_TIME_UNIT_MS: &str = "FIBRETRY_TIME_UNIT_MS";

/// Scheduling priority class for an operation.
///
/// The classes are a hint to the [`Scheduler`](crate::scheduler::Scheduler);
/// how (or whether) they change scheduling is up to the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Work the user is actively waiting on, e.g. refreshing what is on screen
    UserInteractive,

    /// Work the user started and expects results from soon
    UserInitiated,

    /// No particular urgency was requested
    Default,

    /// Long-running work the user knows about
    Utility,

    /// Maintenance work nobody is waiting on
    #[default]
    Background,
}

impl Priority {
    /// All priority classes, most urgent first.
    pub const ALL: [Priority; 5] = [
        Priority::UserInteractive,
        Priority::UserInitiated,
        Priority::Default,
        Priority::Utility,
        Priority::Background,
    ];

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::UserInteractive => "user_interactive",
            Priority::UserInitiated => "user_initiated",
            Priority::Default => "default",
            Priority::Utility => "utility",
            Priority::Background => "background",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known [`Priority`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority class {0:?}")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    /// Parses snake_case or kebab-case names, ignoring ASCII case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
            .ok_or_else(|| ParsePriorityError(s.to_string()))
    }
}

/// Immutable retry configuration.
///
/// # Default Configuration
///
/// - `max_attempts`: 10 (total handler invocations, including the first)
/// - `max_delay`: 30 time units
/// - `priority`: [`Priority::Background`]
/// - `time_unit`: 1s
///
/// # Examples
///
/// ```rust
/// use fibretry::policy::{Priority, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 10);
///
/// let custom = RetryPolicy::builder()
///     .max_attempts(5)
///     .max_delay(8)
///     .priority(Priority::UserInitiated)
///     .time_unit(Duration::from_millis(100))
///     .build();
/// assert_eq!(custom.max_delay(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    max_attempts: u32,
    max_delay: u64,
    priority: Priority,
    #[serde(rename = "time_unit_ms", with = "duration_ms")]
    time_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_delay: DEFAULT_MAX_DELAY,
            priority: Priority::default(),
            time_unit: DEFAULT_TIME_UNIT,
        }
    }
}

impl RetryPolicy {
    /// Create a new builder for configuring a policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Total number of handler invocations permitted. `0` means none.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay cap, in time units.
    pub fn max_delay(&self) -> u64 {
        self.max_delay
    }

    /// Priority class operations are scheduled at.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Length of one delay time unit.
    pub fn time_unit(&self) -> Duration {
        self.time_unit
    }

    /// The backoff strategy described by this policy.
    pub fn backoff(&self) -> FibonacciBackoff {
        FibonacciBackoff::new(self.max_attempts, self.max_delay, self.time_unit)
    }

    /// Load a policy from environment variables.
    ///
    /// This will look for:
    /// - `FIBRETRY_MAX_ATTEMPTS` for the attempt budget
    /// - `FIBRETRY_MAX_DELAY` for the delay cap (time units)
    /// - `FIBRETRY_PRIORITY` for the priority class, e.g. `user_initiated`
    /// - `FIBRETRY_TIME_UNIT_MS` for the time unit in milliseconds
    ///
    /// Unset variables keep their defaults. A set but unparsable variable is
    /// an error rather than being silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut policy = Self::default();

        if let Some(max_attempts) = env_var::<u32>(ENV_MAX_ATTEMPTS)? {
            policy.max_attempts = max_attempts;
        }
        if let Some(max_delay) = env_var::<u64>(ENV_MAX_DELAY)? {
            policy.max_delay = max_delay;
        }
        if let Some(priority) = env_var::<Priority>(ENV_PRIORITY)? {
            policy.priority = priority;
        }
        if let Some(millis) = env_var::<u64>(ENV_TIME_UNIT_MS)? {
            policy.time_unit = Duration::from_millis(millis);
        }

        Ok(policy)
    }
}

fn env_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RetryError::invalid_config(key, raw, e)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(raw)) => Err(RetryError::invalid_config(
            key,
            raw.to_string_lossy(),
            "not valid unicode",
        )),
    }
}

/// Builder for [`RetryPolicy`].
///
/// Unset parameters fall back to the defaults documented on [`RetryPolicy`].
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<u32>,
    max_delay: Option<u64>,
    priority: Option<Priority>,
    time_unit: Option<Duration>,
}

impl RetryPolicyBuilder {
    /// Set the total number of attempts.
    ///
    /// Default: 10
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the delay cap, in time units.
    ///
    /// Default: 30
    pub fn max_delay(mut self, max_delay: u64) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Set the priority class.
    ///
    /// Default: [`Priority::Background`]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the length of one delay time unit.
    ///
    /// Default: 1s
    pub fn time_unit(mut self, time_unit: Duration) -> Self {
        self.time_unit = Some(time_unit);
        self
    }

    /// Build the policy.
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            max_delay: self.max_delay.unwrap_or(DEFAULT_MAX_DELAY),
            priority: self.priority.unwrap_or_default(),
            time_unit: self.time_unit.unwrap_or(DEFAULT_TIME_UNIT),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::BackoffStrategy;
    use rstest::rstest;

    const ALL_KEYS: [&str; 4] = [ENV_MAX_ATTEMPTS, ENV_MAX_DELAY, ENV_PRIORITY, ENV_TIME_UNIT_MS];

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts(), 10);
        assert_eq!(policy.max_delay(), 30);
        assert_eq!(policy.priority(), Priority::Background);
        assert_eq!(policy.time_unit(), Duration::from_secs(1));
        assert_eq!(RetryPolicy::builder().build(), policy);
    }

    #[test]
    fn test_builder_custom_values() {
        let policy = RetryPolicy::builder()
            .max_attempts(3)
            .max_delay(5)
            .priority(Priority::Utility)
            .time_unit(Duration::from_millis(20))
            .build();

        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.max_delay(), 5);
        assert_eq!(policy.priority(), Priority::Utility);
        assert_eq!(policy.time_unit(), Duration::from_millis(20));
    }

    #[test]
    fn test_backoff_follows_policy() {
        let policy = RetryPolicy::builder()
            .max_attempts(4)
            .time_unit(Duration::from_millis(10))
            .build();
        let backoff = policy.backoff();

        assert_eq!(backoff.max_attempts(), 4);
        assert_eq!(backoff.next_delay(2), Some(Duration::from_millis(10)));
        assert_eq!(backoff.next_delay(3), None);
    }

    #[rstest]
    #[case("user_interactive", Priority::UserInteractive)]
    #[case("User-Initiated", Priority::UserInitiated)]
    #[case("default", Priority::Default)]
    #[case(" utility ", Priority::Utility)]
    #[case("BACKGROUND", Priority::Background)]
    fn test_priority_parse(#[case] raw: &str, #[case] expected: Priority) {
        assert_eq!(raw.parse::<Priority>(), Ok(expected));
    }

    #[test]
    fn test_priority_parse_rejects_unknown() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "unknown priority class \"urgent\"");
    }

    #[test]
    fn test_priority_display_round_trips() {
        for priority in Priority::ALL {
            assert_eq!(priority.to_string().parse::<Priority>(), Ok(priority));
        }
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let policy: RetryPolicy = toml::from_str(
            r#"
            max_attempts = 4
            priority = "user_initiated"
            time_unit_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.max_delay(), DEFAULT_MAX_DELAY);
        assert_eq!(policy.priority(), Priority::UserInitiated);
        assert_eq!(policy.time_unit(), Duration::from_millis(250));
    }

    #[test]
    fn test_serialize_json() {
        let policy = RetryPolicy::default();
        let json = serde_json::to_value(policy).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "max_attempts": 10,
                "max_delay": 30,
                "priority": "background",
                "time_unit_ms": 1000
            })
        );
    }

    #[test]
    fn test_from_env_defaults_when_unset() {
        temp_env::with_vars_unset(ALL_KEYS, || {
            assert_eq!(RetryPolicy::from_env().unwrap(), RetryPolicy::default());
        });
    }

    #[test]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                (ENV_MAX_ATTEMPTS, Some("3")),
                (ENV_MAX_DELAY, Some("12")),
                (ENV_PRIORITY, Some("user-interactive")),
                (ENV_TIME_UNIT_MS, Some("50")),
            ],
            || {
                let policy = RetryPolicy::from_env().unwrap();
                assert_eq!(policy.max_attempts(), 3);
                assert_eq!(policy.max_delay(), 12);
                assert_eq!(policy.priority(), Priority::UserInteractive);
                assert_eq!(policy.time_unit(), Duration::from_millis(50));
            },
        );
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        temp_env::with_vars(
            [
                (ENV_MAX_ATTEMPTS, Some("many")),
                (ENV_MAX_DELAY, None),
                (ENV_PRIORITY, None),
                (ENV_TIME_UNIT_MS, None),
            ],
            || {
                let err = RetryPolicy::from_env().unwrap_err();
                assert!(matches!(
                    err,
                    RetryError::InvalidConfig { ref key, ref value, .. }
                        if key == ENV_MAX_ATTEMPTS && value == "many"
                ));
            },
        );
    }
}
