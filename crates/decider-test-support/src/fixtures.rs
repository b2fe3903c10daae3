//! Canned contexts, metadata, and wiring for pipeline tests.

use std::sync::Arc;

use decider_core::{
    AuditOrigin, Auditor, BatchContext, BatchCoordinator, Dispatcher, FileMetadata, JobCatalog,
    JobTrigger, Prober, WorkQueue,
};
use decider_events::EventBus;
use decider_telemetry::Metrics;

/// Correlation id used by [`batch`].
pub const CORRELATION_ID: &str = "corr-1";
/// Project id used by [`catalog`].
pub const PROJECT_ID: &str = "test-project";
/// Region used by [`catalog`].
pub const REGION: &str = "us-central1";

/// Batch context whose batch id mirrors [`CORRELATION_ID`].
#[must_use]
pub fn batch() -> BatchContext {
    BatchContext::for_request(CORRELATION_ID)
}

/// Metadata with the given extension and size.
#[must_use]
pub fn metadata(extension: &str, size_bytes: u64) -> FileMetadata {
    FileMetadata {
        size_bytes,
        extension: extension.to_string(),
        content_type: String::new(),
        range_supported: true,
    }
}

/// Default job catalog for [`PROJECT_ID`] in [`REGION`].
#[must_use]
pub fn catalog() -> JobCatalog {
    JobCatalog::with_defaults(PROJECT_ID, REGION)
}

/// Auditor writing into `bus`.
#[must_use]
pub fn auditor(bus: &EventBus) -> Auditor {
    Auditor::new(Arc::new(bus.clone()), AuditOrigin::new("DEV"), CORRELATION_ID)
}

/// Metrics registry that is never exported.
///
/// # Panics
///
/// Panics if the registry cannot be built.
#[must_use]
pub fn metrics() -> Metrics {
    Metrics::new().expect("metrics registry")
}

/// Coordinator over the given collaborators with the default catalog.
#[must_use]
pub fn coordinator(
    prober: impl Prober + 'static,
    trigger: impl JobTrigger + 'static,
    queue: impl WorkQueue + 'static,
) -> BatchCoordinator {
    let dispatcher = Dispatcher::new(Arc::new(trigger), Arc::new(queue), catalog());
    BatchCoordinator::new(Arc::new(prober), dispatcher, metrics())
}
