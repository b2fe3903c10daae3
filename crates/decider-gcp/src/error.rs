//! Error types for Google Cloud adapters.

use thiserror::Error;

/// Primary error type for Google Cloud calls.
#[derive(Debug, Error)]
pub enum GcpError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The configured endpoint cannot carry a path.
    #[error("endpoint {endpoint} cannot be used as a base URL")]
    InvalidEndpoint {
        /// Offending endpoint.
        endpoint: String,
    },
    /// The request could not be sent or its response read.
    #[error("{operation} request failed")]
    Request {
        /// Operation identifier.
        operation: &'static str,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("{operation} returned status {status}: {body}")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// BigQuery accepted the request but rejected rows.
    #[error("insert into {table} rejected rows: {detail}")]
    InsertRejected {
        /// Fully-qualified table.
        table: String,
        /// Serialised `insertErrors`.
        detail: String,
    },
}

/// Convenience alias for Google Cloud results.
pub type GcpResult<T> = Result<T, GcpError>;
