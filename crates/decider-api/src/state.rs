//! Shared handler state.

use std::sync::Arc;

use decider_core::{AuditOrigin, AuditSink, Auditor, BatchCoordinator};
use decider_telemetry::Metrics;

/// Dependencies shared by every request.
pub struct ApiState {
    pub(crate) coordinator: BatchCoordinator,
    pub(crate) audit_sink: Arc<dyn AuditSink>,
    pub(crate) origin: AuditOrigin,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    /// Bundle the coordinator, audit sink, and metrics.
    #[must_use]
    pub fn new(
        coordinator: BatchCoordinator,
        audit_sink: Arc<dyn AuditSink>,
        origin: AuditOrigin,
        telemetry: Metrics,
    ) -> Self {
        Self {
            coordinator,
            audit_sink,
            origin,
            telemetry,
        }
    }

    pub(crate) fn auditor(&self, trace_id: impl Into<String>) -> Auditor {
        Auditor::new(Arc::clone(&self.audit_sink), self.origin.clone(), trace_id)
            .with_metrics(self.telemetry.clone())
    }
}
