//! Bounded retry with exponential backoff.
//!
//! Wraps fallible portal reads (login, catalog) that are safe to repeat.
//! Every swallowed failure is logged and reported to an optional observer;
//! callers only see the first success or the final failure.

mod executor;

pub use executor::retry;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::RetryConfig;

/// Errors that know whether repeating the operation could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// A failed attempt, as reported to the observer hook.
#[derive(Debug, Clone)]
pub struct RetryEvent {
    /// Operation name given to [`retry`].
    pub operation: String,
    /// 1-based attempt number that failed.
    pub attempt: u32,
    /// Total attempt budget.
    pub max_attempts: u32,
    /// Display form of the error.
    pub error: String,
    /// Delay before the next attempt, `None` when giving up.
    pub next_delay: Option<Duration>,
}

/// Callback invoked for every failed attempt.
pub type RetryHook = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// How often and how patiently to retry.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
    hook: Option<RetryHook>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("hook", &self.hook.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: initial_delay,
            backoff_multiplier: 1.0,
            hook: None,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.initial_delay_ms)),
            backoff_multiplier: config.backoff_multiplier.max(1.0),
            hook: None,
        }
    }

    /// Sets exponential backoff parameters.
    pub fn with_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self.max_delay = max_delay.max(self.initial_delay);
        self
    }

    /// Sets the observer called for every failed attempt.
    pub fn with_hook(mut self, hook: RetryHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    pub(crate) fn notify(&self, event: &RetryEvent) {
        if let Some(hook) = &self.hook {
            hook(event);
        }
    }
}

/// Final failure of a retried operation.
#[derive(Debug, Error)]
pub enum RetryError<E: std::fmt::Display + std::fmt::Debug> {
    /// Every attempt failed.
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last: E,
    },

    /// A failure that retrying cannot fix.
    #[error("{operation} failed permanently: {error}")]
    Permanent { operation: String, error: E },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_delay_backoff_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100))
            .with_backoff(2.0, Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
        assert_eq!(policy.delay_after(4), Duration::from_millis(500));
        assert_eq!(policy.delay_after(30), Duration::from_millis(500));
    }

    #[test]
    fn test_from_config() {
        let config = RetryConfig {
            max_attempts: 7,
            initial_delay_ms: 50,
            max_delay_ms: 10,
            backoff_multiplier: 0.5,
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts(), 7);
        // max delay never below the initial delay, multiplier never below 1
        assert_eq!(policy.delay_after(5), Duration::from_millis(50));
    }

    #[test]
    fn test_error_display() {
        let err: RetryError<String> = RetryError::Exhausted {
            operation: "login".to_string(),
            attempts: 3,
            last: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "login failed after 3 attempts: timeout");
    }
}
