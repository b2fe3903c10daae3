//! # Design
//!
//! - Centralize application-level errors for bootstrap and serving.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: decider_config::ConfigError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: decider_api::ApiServerError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: decider_telemetry::TelemetryError,
    },
    /// Building a cloud adapter failed.
    #[error("cloud adapter setup failed")]
    Gcp {
        /// Operation identifier.
        operation: &'static str,
        /// Source adapter error.
        source: decider_gcp::GcpError,
    },
    /// Building the probe HTTP client failed.
    #[error("http client setup failed")]
    HttpClient {
        /// Operation identifier.
        operation: &'static str,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: decider_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: decider_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: decider_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn gcp(operation: &'static str, source: decider_gcp::GcpError) -> Self {
        Self::Gcp { operation, source }
    }

    pub(crate) const fn http_client(operation: &'static str, source: reqwest::Error) -> Self {
        Self::HttpClient { operation, source }
    }
}
