//! HTTP surface modules (router, handlers, middleware).

/// Batch analyze endpoint.
pub mod analyze;
/// Shared constants and header names.
pub mod constants;
/// Problem response helpers and error types.
pub mod errors;
/// Health and metrics endpoints.
pub mod health;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub mod telemetry;
