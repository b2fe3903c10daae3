#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! HTTP surface for the compute decider.
//!
//! Layout: `http/router.rs` (router and server host), `http/analyze.rs`
//! (batch endpoint), `http/health.rs` (health and metrics), `http/errors.rs`
//! (problem responses), `http/telemetry.rs` (request metrics middleware),
//! `models.rs` (wire DTOs), `state.rs` (shared handler state).

pub mod error;
pub mod http;
pub mod models;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use models::{AnalyzeRequest, FileResult, ProblemDetails};
pub use state::ApiState;
