//! Error type shared by every provider and service.
//!
//! Vendor "not found" conditions never surface here for lookups: `get()` returns
//! `Ok(None)` and `delete()` returns `Ok(false)`. Everything else is reported as a
//! [`CloudError`] tagged with an [`ErrorKind`].

use std::error::Error;
use std::fmt;

/// Error raised by CloudBridge operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The wait deadline passed before the resource reached a target state.
    WaitStateTimeout,
    /// The resource entered a state from which the target can never be reached.
    WaitStateTerminal,
    /// Bad launch configuration or bad [`BridgeConfig`](crate::config::BridgeConfig).
    InvalidConfiguration,
    InvalidName,
    InvalidLabel,
    /// The provider reports a name collision.
    DuplicateResource,
    /// An argument was outside its allowed range.
    InvalidValue,
    /// A resource referenced by an operation does not exist.
    NotFound,
    /// No provider is registered under the requested id.
    UnknownProvider,
    Network,
    ServiceUnavailable,
    RateLimited,
    /// Any other vendor failure, passed through unmodified.
    Provider,
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl Error for CloudError {}

impl CloudError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidValue, message)
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfiguration, message)
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{what} {id} does not exist"))
    }

    pub fn duplicate(what: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateResource,
            format!("{what} with name {name} already exists"),
        )
    }

    /// True for both wait failures, for callers that do not care which one fired.
    #[must_use]
    pub const fn is_wait_state(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::WaitStateTimeout | ErrorKind::WaitStateTerminal
        )
    }

    /// True for failures worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Network | ErrorKind::ServiceUnavailable | ErrorKind::RateLimited
        )
    }
}

pub type CloudResult<T> = Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_source() {
        let err = CloudError::new(ErrorKind::Provider, "boom").with_source("ec2");
        assert_eq!(err.to_string(), "Provider: boom (ec2)");
    }

    #[test]
    fn test_wait_state_kinds() {
        assert!(CloudError::new(ErrorKind::WaitStateTimeout, "t").is_wait_state());
        assert!(CloudError::new(ErrorKind::WaitStateTerminal, "t").is_wait_state());
        assert!(!CloudError::new(ErrorKind::InvalidValue, "t").is_wait_state());
    }

    #[test]
    fn test_transient_kinds() {
        assert!(CloudError::new(ErrorKind::RateLimited, "slow down").is_transient());
        assert!(!CloudError::duplicate("Bucket", "b1").is_transient());
    }
}
