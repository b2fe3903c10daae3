//! Executes routing decisions against the job trigger and work queue.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use decider_events::{AuditEventKind, AuditStatus};
use serde::Serialize;
use tracing::info;

use crate::audit::Auditor;
use crate::error::DecisionError;
use crate::model::{JobCatalog, JobTarget, ProbedFile, RoutingDecision, WorkArguments};
use crate::service::{JobTrigger, WorkQueue};

/// Status written on freshly queued work items.
pub const QUEUED_STATUS: &str = "QUEUED";

/// Row appended to the work queue.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueRecord<'a> {
    trace_id: &'a str,
    contract_id: &'a str,
    status: &'static str,
    timestamp: DateTime<Utc>,
    function_name: &'a str,
    arguments: &'a WorkArguments,
    environment: &'a str,
}

/// Performs the side effects of a [`RoutingDecision`].
#[derive(Clone)]
pub struct Dispatcher {
    trigger: Arc<dyn JobTrigger>,
    queue: Arc<dyn WorkQueue>,
    jobs: JobCatalog,
}

impl Dispatcher {
    /// Build a dispatcher over the given collaborators.
    #[must_use]
    pub fn new(trigger: Arc<dyn JobTrigger>, queue: Arc<dyn WorkQueue>, jobs: JobCatalog) -> Self {
        Self {
            trigger,
            queue,
            jobs,
        }
    }

    /// Execute `decision` for `file`.
    ///
    /// For [`RoutingDecision::EnqueueThenStream`] the enqueue must succeed
    /// before the trigger is attempted.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator failure, after auditing it.
    pub async fn execute(
        &self,
        decision: &RoutingDecision,
        file: &ProbedFile,
        audit: &Auditor,
    ) -> Result<(), DecisionError> {
        match decision {
            RoutingDecision::StreamJob { target, args } => {
                self.stream(*target, args, file, audit).await
            }
            RoutingDecision::EnqueueThenStream { work, target, args } => {
                self.enqueue(work, file, audit).await?;
                self.stream(*target, args, file, audit).await
            }
            RoutingDecision::Skip => {
                info!(url = %file.url, extension = %file.metadata.extension, "skipping unsupported file type");
                Ok(())
            }
        }
    }

    async fn stream(
        &self,
        target: JobTarget,
        args: &[String],
        file: &ProbedFile,
        audit: &Auditor,
    ) -> Result<(), DecisionError> {
        let job_id = self.jobs.job_id(target);
        audit
            .record(
                AuditEventKind::TriggerJob,
                AuditStatus::InProgress,
                Some(&file.url),
                format!("triggering {job_id}"),
            )
            .await;

        if let Err(err) = self.trigger.trigger(job_id, args).await {
            let error = DecisionError::TriggerFailed {
                url: file.url.clone(),
                job_id: job_id.to_string(),
                source: err.into(),
            };
            audit
                .record(
                    AuditEventKind::TriggerJobFailed,
                    AuditStatus::Failed,
                    Some(&file.url),
                    error.describe(),
                )
                .await;
            return Err(error);
        }
        info!(url = %file.url, job = target.as_str(), "job triggered");
        Ok(())
    }

    async fn enqueue(
        &self,
        work: &WorkArguments,
        file: &ProbedFile,
        audit: &Auditor,
    ) -> Result<(), DecisionError> {
        let origin = audit.origin();
        let record = QueueRecord {
            trace_id: audit.trace_id(),
            contract_id: audit.trace_id(),
            status: QUEUED_STATUS,
            timestamp: Utc::now(),
            function_name: &origin.function_name,
            arguments: work,
            environment: &origin.environment,
        };

        let payload = match serde_json::to_value(&record) {
            Ok(payload) => payload,
            Err(source) => {
                let error = DecisionError::SerializationFailed {
                    url: file.url.clone(),
                    source,
                };
                audit
                    .record(
                        AuditEventKind::EnqueueWorkItemFailed,
                        AuditStatus::Failed,
                        Some(&file.url),
                        error.describe(),
                    )
                    .await;
                return Err(error);
            }
        };

        audit
            .record(
                AuditEventKind::EnqueueWorkItem,
                AuditStatus::InProgress,
                Some(&file.url),
                "",
            )
            .await;

        if let Err(err) = self.queue.enqueue(payload).await {
            let error = DecisionError::EnqueueFailed {
                url: file.url.clone(),
                source: err.into(),
            };
            audit
                .record(
                    AuditEventKind::EnqueueWorkItemFailed,
                    AuditStatus::Failed,
                    Some(&file.url),
                    error.describe(),
                )
                .await;
            return Err(error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditOrigin;
    use crate::classify::classify;
    use crate::model::FileMetadata;
    use async_trait::async_trait;
    use decider_events::EventBus;
    use serde_json::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Captured {
        triggers: Mutex<Vec<String>>,
        rows: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl JobTrigger for Captured {
        async fn trigger(&self, job_id: &str, _args: &[String]) -> anyhow::Result<()> {
            self.triggers
                .lock()
                .expect("triggers lock")
                .push(job_id.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl WorkQueue for Captured {
        async fn enqueue(&self, record: Value) -> anyhow::Result<()> {
            self.rows.lock().expect("rows lock").push(record);
            Ok(())
        }
    }

    fn probed(url: &str, extension: &str) -> ProbedFile {
        ProbedFile {
            url: url.to_string(),
            file_name: url.rsplit('/').next().unwrap_or_default().to_string(),
            batch_id: "batch-1".into(),
            correlation_id: "trace-1".into(),
            metadata: FileMetadata {
                size_bytes: 10,
                extension: extension.into(),
                content_type: "application/zip".into(),
                range_supported: false,
            },
        }
    }

    fn setup() -> (Arc<Captured>, Dispatcher, EventBus, Auditor) {
        let captured = Arc::new(Captured::default());
        let dispatcher = Dispatcher::new(
            captured.clone(),
            captured.clone(),
            JobCatalog::with_defaults("p", "r"),
        );
        let bus = EventBus::new();
        let auditor = Auditor::new(Arc::new(bus.clone()), AuditOrigin::new("QA"), "trace-1");
        (captured, dispatcher, bus, auditor)
    }

    #[tokio::test]
    async fn queued_row_carries_status_origin_and_arguments() {
        let (captured, dispatcher, _bus, auditor) = setup();
        let file = probed("https://h/a.zip", ".zip");

        dispatcher
            .execute(&classify(&file), &file, &auditor)
            .await
            .expect("dispatch");

        let rows = captured.rows.lock().expect("rows lock").clone();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["status"], QUEUED_STATUS);
        assert_eq!(row["traceId"], "trace-1");
        assert_eq!(row["contractId"], "trace-1");
        assert_eq!(row["functionName"], "compute-decider");
        assert_eq!(row["environment"], "QA");
        assert_eq!(row["arguments"]["fileName"], "a.zip");
        assert_eq!(row["arguments"]["fileExtenstion"], ".zip");
        assert_eq!(
            captured.triggers.lock().expect("triggers lock").as_slice(),
            ["projects/p/locations/r/jobs/prj-wayne-zip-downloader"]
        );
    }

    #[tokio::test]
    async fn skip_touches_nothing() {
        let (captured, dispatcher, bus, auditor) = setup();
        let file = probed("https://h/a.csv", ".csv");

        dispatcher
            .execute(&RoutingDecision::Skip, &file, &auditor)
            .await
            .expect("skip");

        assert!(captured.rows.lock().expect("rows lock").is_empty());
        assert!(captured.triggers.lock().expect("triggers lock").is_empty());
        assert!(bus.recorded().is_empty());
    }
}
