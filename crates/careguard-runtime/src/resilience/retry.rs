//! Retry policy for transient provider failures.

use std::time::Duration;

use backon::ExponentialBuilder;
use serde::{Deserialize, Serialize};

fn default_min_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(8)
}

/// Exponential backoff for throttled or timed-out calls.
///
/// `max_retries: 0` (the default) disables retrying entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default)]
    pub max_retries: usize,

    #[serde(default = "default_min_delay", with = "humantime_serde")]
    pub min_delay: Duration,

    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_delay > self.max_delay {
            return Err(format!(
                "retry min_delay ({}) exceeds max_delay ({})",
                humantime::format_duration(self.min_delay),
                humantime::format_duration(self.max_delay)
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_enabled());
        assert_eq!(policy, RetryPolicy::disabled());
    }

    #[test]
    fn test_parse_human_durations() {
        let policy: RetryPolicy = serde_yaml::from_str(
            r#"
max_retries: 2
min_delay: 250ms
max_delay: 2s
"#,
        )
        .unwrap();
        assert!(policy.is_enabled());
        assert_eq!(policy.min_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(2));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_inverted_delays_rejected() {
        let policy = RetryPolicy {
            max_retries: 1,
            min_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(1),
        };
        let err = policy.validate().unwrap_err();
        assert!(err.contains("5s"));
    }
}
