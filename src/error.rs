//! Error types for the broadcast bus.

use thiserror::Error;

/// Result type alias for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors surfaced by the dispatcher's public API.
///
/// Consumer callback failures are never wrapped in `BusError` and never
/// returned from `produce`/`close` — they are routed to the configured
/// error handler instead (see `disruptor::dispatcher::Dispatcher`).
#[derive(Error, Debug)]
pub enum BusError {
    /// Invalid configuration parameter (non-positive capacity, zero
    /// consumers, non-power-of-two size, ...).
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A `register_consumer` call arrived after the first publication,
    /// or a `produce` call arrived after `close` began.
    #[error("bus is closed to this operation")]
    Closed,

    /// A timed wait (`produce_timeout`) exceeded its deadline.
    #[error("operation timed out")]
    Timeout,

    /// An unexpected internal condition — a logic error, not a caller
    /// mistake.
    #[error("unexpected error: {message}")]
    Unexpected {
        /// Description of the unexpected condition.
        message: String,
    },
}

impl BusError {
    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Build an unexpected-condition error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_is_not_recoverable() {
        let err = BusError::config("size must be a power of two");
        assert!(matches!(err, BusError::Config { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn timeout_is_recoverable() {
        assert!(BusError::Timeout.is_recoverable());
    }
}
