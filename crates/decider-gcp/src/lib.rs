#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Google Cloud adapters for the decision pipeline's collaborators.
//!
//! Layout: `client.rs` (shared HTTP client and URL building), `bigquery.rs`
//! (audit sink and work queue over `insertAll`), `run.rs` (Cloud Run job
//! trigger), `storage.rs` (Cloud Storage dedup lookups), `error.rs`.

pub mod bigquery;
pub mod client;
pub mod error;
pub mod run;
pub mod storage;

pub use bigquery::{BigQueryAuditSink, BigQueryTable, BigQueryWorkQueue};
pub use client::GcpClient;
pub use error::{GcpError, GcpResult};
pub use run::CloudRunJobs;
pub use storage::GcsDedupStore;
