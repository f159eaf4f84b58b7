//! Local retry for provider calls that race against eventual consistency.
//!
//! CloudBridge has no blanket retry policy; vendor SDKs own that. This helper is
//! used where a single call is known to fail transiently right after a related
//! mutation (for example, capturing an image from a freshly created instance).

use crate::error::CloudResult;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Sleep the same delay between every attempt.
    Fixed,
    /// Double the delay after every attempt, up to `max_delay`.
    Exponential,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            backoff: Backoff::Fixed,
        }
    }
}

/// Run `operation`, retrying transient failures (see
/// [`CloudError::is_transient`](crate::error::CloudError::is_transient)).
///
/// # Errors
///
/// Returns the first non-transient error, or the last transient error once
/// `max_attempts` calls have been made.
pub fn retry_with_backoff<F, T>(config: &RetryConfig, mut operation: F) -> CloudResult<T>
where
    F: FnMut() -> CloudResult<T>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;
        match operation() {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_transient() || attempt >= config.max_attempts {
                    return Err(err);
                }

                tracing::warn!(attempt, ?delay, error = %err, "transient failure, retrying");
                std::thread::sleep(delay);

                if config.backoff == Backoff::Exponential {
                    delay = delay.saturating_mul(2).min(config.max_delay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CloudError, ErrorKind};

    #[test]
    fn test_retry_until_success() {
        let config = RetryConfig::fixed(3, Duration::from_millis(1));
        let mut attempts = 0;

        let result = retry_with_backoff(&config, || {
            attempts += 1;
            if attempts < 3 {
                Err(CloudError::new(ErrorKind::ServiceUnavailable, "busy"))
            } else {
                Ok(42)
            }
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_retry_exhausted() {
        let config = RetryConfig::fixed(2, Duration::from_millis(1));
        let mut attempts = 0;

        let result: CloudResult<()> = retry_with_backoff(&config, || {
            attempts += 1;
            Err(CloudError::new(ErrorKind::Network, "down"))
        });

        assert_eq!(result.unwrap_err().kind, ErrorKind::Network);
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_non_transient_not_retried() {
        let config = RetryConfig::default();
        let mut attempts = 0;

        let result: CloudResult<()> = retry_with_backoff(&config, || {
            attempts += 1;
            Err(CloudError::invalid_value("bad"))
        });

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
