#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Telemetry primitives shared across the compute decider workspace.
//!
//! Layout: `init.rs` (subscriber setup), `context.rs` (request context
//! propagation), `layers.rs` (request-id middleware), `metrics.rs`
//! (Prometheus registry), `error.rs` (telemetry errors).

pub mod context;
pub mod error;
pub mod init;
pub mod layers;
pub mod metrics;

pub use context::{GlobalContextGuard, current_request_id, with_request_context};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{propagate_request_id_layer, set_request_id_layer};
pub use metrics::{Metrics, MetricsSnapshot};
