//! Telemetry error types.

use thiserror::Error;

/// Errors raised while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directives could not be parsed.
    #[error("Invalid log filter '{directives}': {reason}")]
    InvalidFilter {
        /// The rejected directives.
        directives: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already installed, or installing it failed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::LoggingInit("already set".to_string());
        assert_eq!(err.to_string(), "Failed to initialize logging: already set");

        let err = TelemetryError::InvalidFilter {
            directives: "=".to_string(),
            reason: "empty".to_string(),
        };
        assert!(err.to_string().contains("'='"));
    }
}
