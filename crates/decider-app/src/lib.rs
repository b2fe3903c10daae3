#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Compute decider application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (service wiring), `local.rs` (log-only collaborators
//! for the local backend), `error.rs` (application errors).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application-level errors.
pub mod error;
/// Collaborators used when running without cloud access.
pub mod local;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
