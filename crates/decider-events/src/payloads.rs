//! Audit event payloads recorded at every decision point.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Number of events the in-memory bus keeps by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1_024;

/// Lifecycle status attached to an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    /// A unit of work began.
    Started,
    /// A unit of work is underway (e.g. a downstream call was issued).
    InProgress,
    /// A unit of work finished successfully.
    Completed,
    /// A unit of work failed.
    Failed,
}

impl AuditStatus {
    /// Wire representation stored in the audit table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// Named decision points that produce audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditEventKind {
    /// An analyze request was accepted.
    ApplicationStarted,
    /// An analyze request finished and its response was produced.
    ApplicationCompleted,
    /// The request body could not be read.
    RequestBodyFailed,
    /// The request body was not valid JSON for the analyze contract.
    InvalidJsonFormat,
    /// The request did not carry any file URL.
    FileUrlMissing,
    /// A batch item finished with an error.
    ErrorFetchingFileSize,
    /// Metadata probing of a URL began.
    AnalyzeFileStarted,
    /// Metadata probing of a URL succeeded.
    AnalyzeFileCompleted,
    /// Metadata probing of a URL failed.
    AnalyzeFileFailed,
    /// The dedup store reported the file as already processed.
    FileAlreadyProcessed,
    /// The dedup store could not be consulted.
    CheckFileExistsFailed,
    /// A downstream job trigger was issued.
    TriggerJob,
    /// A downstream job trigger failed.
    TriggerJobFailed,
    /// A work item enqueue was issued.
    EnqueueWorkItem,
    /// A work item enqueue (or its serialization) failed.
    EnqueueWorkItemFailed,
}

impl AuditEventKind {
    /// Fully-qualified event name stored in the audit table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationStarted => "compute_decider.application_started",
            Self::ApplicationCompleted => "compute_decider.application_completed",
            Self::RequestBodyFailed => "compute_decider.request_body_failed",
            Self::InvalidJsonFormat => "compute_decider.invalid_json_format",
            Self::FileUrlMissing => "compute_decider.file_url_missing",
            Self::ErrorFetchingFileSize => "compute_decider.error_fetching_file_size",
            Self::AnalyzeFileStarted => "compute_decider.analyze_file_started",
            Self::AnalyzeFileCompleted => "compute_decider.analyze_file_completed",
            Self::AnalyzeFileFailed => "compute_decider.analyze_file_failed",
            Self::FileAlreadyProcessed => "compute_decider.file_already_processed",
            Self::CheckFileExistsFailed => "compute_decider.failed_to_check_file_exists",
            Self::TriggerJob => "compute_decider.trigger_cloud_run_job",
            Self::TriggerJobFailed => "compute_decider.trigger_cloud_run_job_failed",
            Self::EnqueueWorkItem => "compute_decider.enqueue_work_item",
            Self::EnqueueWorkItemFailed => "compute_decider.enqueue_work_item_failed",
        }
    }
}

impl Serialize for AuditEventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Audit record written to the append-only audit sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Correlation identifier of the request that produced the event.
    #[serde(rename = "traceid")]
    pub trace_id: String,
    /// Contract identifier; mirrors the trace id for single-request contracts.
    pub contract_id: String,
    /// Decision point that produced the event.
    pub event: AuditEventKind,
    /// Lifecycle status at the decision point.
    pub status: AuditStatus,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
    /// Logical name of the emitting service.
    pub function_name: String,
    /// Deployment environment tag.
    pub environment: String,
    /// Free-text detail, empty when there is nothing to add.
    pub message: String,
    /// Subject URL when the event concerns a single file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl AuditEvent {
    /// Build an event stamped with the current time.
    #[must_use]
    pub fn new(kind: AuditEventKind, status: AuditStatus, trace_id: impl Into<String>) -> Self {
        let trace_id = trace_id.into();
        Self {
            contract_id: trace_id.clone(),
            trace_id,
            event: kind,
            status,
            timestamp: Utc::now(),
            function_name: String::new(),
            environment: String::new(),
            message: String::new(),
            file_url: None,
        }
    }

    /// Attach the emitting service name and environment.
    #[must_use]
    pub fn with_origin(
        mut self,
        function_name: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        self.function_name = function_name.into();
        self.environment = environment.into();
        self
    }

    /// Attach a free-text message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the subject URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.file_url = Some(url.into());
        self
    }
}
