#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Audit events for the compute decider.
//!
//! Layout: `payloads.rs` (audit record types and event names), `routing.rs`
//! (bounded in-memory audit bus).

pub mod payloads;
pub mod routing;

pub use payloads::{AuditEvent, AuditEventKind, AuditStatus, DEFAULT_HISTORY_CAPACITY};
pub use routing::EventBus;
