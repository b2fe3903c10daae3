#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Environment-driven configuration for the compute decider.
//!
//! Layout: `defaults.rs` (built-in values), `model.rs` (typed settings),
//! `loader.rs` (environment parsing), `error.rs` (configuration errors).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::{Backend, DeciderConfig, Endpoints, JobNames, ServerSettings, StorageSettings};
