//! Request-scoped audit helper.
//!
//! # Design
//! - Audit writes are best effort: a sink failure is logged and counted,
//!   never surfaced to the request.
//! - Every audit record is mirrored to `tracing` so local runs see the trail.

use std::sync::Arc;

use decider_events::{AuditEvent, AuditEventKind, AuditStatus};
use decider_telemetry::Metrics;
use tracing::{info, warn};

use crate::service::AuditSink;

/// Identity stamped on every audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOrigin {
    /// Logical service name.
    pub function_name: String,
    /// Deployment environment tag.
    pub environment: String,
}

impl AuditOrigin {
    /// Default service name.
    pub const APPLICATION_NAME: &'static str = "compute-decider";

    /// Origin for this service in `environment`.
    #[must_use]
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            function_name: Self::APPLICATION_NAME.to_string(),
            environment: environment.into(),
        }
    }
}

/// Emits audit records tagged with one request's correlation id.
#[derive(Clone)]
pub struct Auditor {
    sink: Arc<dyn AuditSink>,
    origin: AuditOrigin,
    trace_id: String,
    metrics: Option<Metrics>,
}

impl Auditor {
    /// Build an auditor for one request.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>, origin: AuditOrigin, trace_id: impl Into<String>) -> Self {
        Self {
            sink,
            origin,
            trace_id: trace_id.into(),
            metrics: None,
        }
    }

    /// Count sink failures in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Correlation id stamped on every record.
    #[must_use]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Service identity stamped on every record.
    #[must_use]
    pub const fn origin(&self) -> &AuditOrigin {
        &self.origin
    }

    /// Record one audit event. Never fails.
    pub async fn record(
        &self,
        kind: AuditEventKind,
        status: AuditStatus,
        url: Option<&str>,
        message: impl Into<String>,
    ) {
        let mut event = AuditEvent::new(kind, status, self.trace_id.clone())
            .with_origin(
                self.origin.function_name.clone(),
                self.origin.environment.clone(),
            )
            .with_message(message);
        if let Some(url) = url {
            event = event.with_url(url);
        }

        if status == AuditStatus::Failed {
            warn!(
                event = kind.as_str(),
                status = status.as_str(),
                trace_id = %self.trace_id,
                file_url = url.unwrap_or_default(),
                message = %event.message,
                "audit"
            );
        } else {
            info!(
                event = kind.as_str(),
                status = status.as_str(),
                trace_id = %self.trace_id,
                file_url = url.unwrap_or_default(),
                "audit"
            );
        }

        if let Err(err) = self.sink.record_event(event).await {
            warn!(error = %err, event = kind.as_str(), "failed to record audit event");
            if let Some(metrics) = &self.metrics {
                metrics.inc_audit_failure();
            }
        }
    }
}
