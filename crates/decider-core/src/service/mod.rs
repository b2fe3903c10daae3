//! Collaborator traits implemented by cloud adapters and test doubles.

use async_trait::async_trait;
use decider_events::{AuditEvent, EventBus};
use serde_json::Value;

use crate::audit::Auditor;
use crate::error::DecisionError;
use crate::model::{BatchContext, ProbedFile, RoutingDecision};

/// Append-only sink for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one audit record.
    async fn record_event(&self, event: AuditEvent) -> anyhow::Result<()>;
}

/// Lookup of already-processed files.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Whether `key` exists within `namespace` (e.g. an object in a bucket).
    async fn exists(&self, namespace: &str, key: &str) -> anyhow::Result<bool>;
}

/// Launches a named batch job with positional arguments.
#[async_trait]
pub trait JobTrigger: Send + Sync {
    /// Start `job_id` with `args`; returns once the launch was accepted.
    async fn trigger(&self, job_id: &str, args: &[String]) -> anyhow::Result<()>;
}

/// Append-only store for work items.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Append one serialised work item.
    async fn enqueue(&self, record: Value) -> anyhow::Result<()>;
}

/// Learns metadata for a URL without downloading it.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `url`, emitting audit records through `audit`.
    async fn probe(
        &self,
        url: &str,
        batch: &BatchContext,
        audit: &Auditor,
    ) -> Result<ProbedFile, DecisionError>;
}

/// Maps a probed file to a routing decision. Implementations must be pure.
pub trait Classifier: Send + Sync {
    /// Decide what to do with `file`.
    fn classify(&self, file: &ProbedFile) -> RoutingDecision;
}

#[async_trait]
impl AuditSink for EventBus {
    async fn record_event(&self, event: AuditEvent) -> anyhow::Result<()> {
        self.publish(event);
        Ok(())
    }
}
