//! Error types for telemetry operations.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while installing logging or exporting metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed, or installing failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A decider counter could not be created or registered.
    #[error("failed to {stage} counter {name}")]
    Counter {
        /// Counter name.
        name: &'static str,
        /// `build` or `register`.
        stage: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The registry could not be rendered as Prometheus text.
    #[error("failed to render metrics")]
    Render {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Rendered exposition text was not UTF-8.
    #[error("metrics output was not valid utf-8")]
    RenderUtf8 {
        /// Underlying UTF-8 conversion error.
        source: std::string::FromUtf8Error,
    },
}
