//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable was not set (or was blank).
    #[error("missing required configuration '{field}'")]
    MissingField {
        /// Environment variable name.
        field: &'static str,
    },
    /// A variable held a value that could not be used.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Environment variable name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
