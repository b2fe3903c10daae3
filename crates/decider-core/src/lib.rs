#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Decision pipeline for batches of remote file URLs.
//!
//! Each URL is probed with a HEAD request, classified by extension, and
//! dispatched to a batch job (optionally via a work queue). Collaborators sit
//! behind the traits in [`service`] so cloud adapters and test doubles plug in
//! interchangeably.

pub mod audit;
pub mod classify;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod probe;
pub mod service;

pub use audit::{AuditOrigin, Auditor};
pub use classify::{ExtensionClassifier, classify};
pub use coordinator::{BatchCoordinator, dedup_key};
pub use dispatch::{Dispatcher, QUEUED_STATUS};
pub use error::{BoxError, DecisionError};
pub use model::{
    Action, BYTES_PER_GIB, BatchContext, FileDescriptor, FileMetadata, JobCatalog, JobTarget,
    Outcome, ProbedFile, RoutingDecision, WorkArguments,
};
pub use probe::{HttpProber, UnexpectedStatus};
pub use service::{AuditSink, Classifier, DedupStore, JobTrigger, Prober, WorkQueue};
