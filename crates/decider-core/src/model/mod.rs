//! Domain types flowing through the probe, classify, and dispatch stages.

use serde::Serialize;

use crate::error::DecisionError;

/// Bytes per gibibyte; sizes are reported in GiB with a `GB` suffix.
pub const BYTES_PER_GIB: f64 = 1_073_741_824.0;

/// Identifiers shared by every file in one analyze request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchContext {
    /// Correlation id of the request; passed through to jobs and audit records.
    pub correlation_id: String,
    /// Batch id used to namespace dedup keys.
    pub batch_id: String,
}

impl BatchContext {
    /// Build a context whose batch id mirrors the correlation id.
    #[must_use]
    pub fn for_request(correlation_id: impl Into<String>) -> Self {
        let correlation_id = correlation_id.into();
        Self {
            batch_id: correlation_id.clone(),
            correlation_id,
        }
    }
}

/// Metadata learned from a successful HEAD probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Raw `Content-Length` in bytes.
    pub size_bytes: u64,
    /// Extension including the leading dot, or empty.
    pub extension: String,
    /// Raw `Content-Type` header, or empty.
    pub content_type: String,
    /// Whether the server advertised `Accept-Ranges: bytes`.
    pub range_supported: bool,
}

impl FileMetadata {
    /// Size in GiB.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn size_gib(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_GIB
    }

    /// Size formatted with two decimals and a `GB` suffix.
    #[must_use]
    pub fn size_display(&self) -> String {
        format!("{:.2} GB", self.size_gib())
    }
}

/// A file whose probe succeeded. Only these reach the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedFile {
    /// URL exactly as submitted.
    pub url: String,
    /// Last path segment of the URL.
    pub file_name: String,
    /// Batch the file belongs to.
    pub batch_id: String,
    /// Correlation id of the request.
    pub correlation_id: String,
    /// Probed metadata.
    pub metadata: FileMetadata,
}

/// Per-URL record returned to the caller; carries either metadata or an error.
#[derive(Debug)]
pub struct FileDescriptor {
    /// URL exactly as submitted.
    pub url: String,
    /// Last path segment of the URL, empty when it could not be derived.
    pub file_name: String,
    /// Batch the file belongs to.
    pub batch_id: String,
    /// Correlation id of the request.
    pub correlation_id: String,
    /// Metadata when the probe succeeded.
    pub metadata: Option<FileMetadata>,
    /// First failure encountered for this file.
    pub error: Option<DecisionError>,
}

impl FileDescriptor {
    /// Descriptor for a file that was never probed (e.g. already processed).
    #[must_use]
    pub fn unprobed(url: &str, batch: &BatchContext, file_name: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            file_name: file_name.unwrap_or_default(),
            batch_id: batch.batch_id.clone(),
            correlation_id: batch.correlation_id.clone(),
            metadata: None,
            error: None,
        }
    }

    /// Descriptor for a file that failed before any metadata was learned.
    #[must_use]
    pub fn failed(
        url: &str,
        batch: &BatchContext,
        file_name: Option<String>,
        error: DecisionError,
    ) -> Self {
        Self::unprobed(url, batch, file_name).with_error(error)
    }

    /// Attach an error, keeping any metadata already learned.
    #[must_use]
    pub fn with_error(mut self, error: DecisionError) -> Self {
        self.error = Some(error);
        self
    }

    /// Full error message, if the file failed.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(DecisionError::describe)
    }
}

impl From<ProbedFile> for FileDescriptor {
    fn from(file: ProbedFile) -> Self {
        Self {
            url: file.url,
            file_name: file.file_name,
            batch_id: file.batch_id,
            correlation_id: file.correlation_id,
            metadata: Some(file.metadata),
            error: None,
        }
    }
}

/// Downstream batch jobs a file can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobTarget {
    /// Streams plain JSON files.
    FileStreamer,
    /// Streams gzip-compressed files.
    GzStreamer,
    /// Downloads and unpacks zip archives.
    ZipDownloader,
}

impl JobTarget {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileStreamer => "file_streamer",
            Self::GzStreamer => "gz_streamer",
            Self::ZipDownloader => "zip_downloader",
        }
    }
}

/// Deployed job names for each [`JobTarget`], qualified by project and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCatalog {
    file_streamer: String,
    gz_streamer: String,
    zip_downloader: String,
}

impl JobCatalog {
    /// Default job name for plain JSON files.
    pub const DEFAULT_FILE_STREAMER: &'static str = "prj-wayne-file-streamer";
    /// Default job name for gzip files.
    pub const DEFAULT_GZ_STREAMER: &'static str = "prj-wayne-gz-streamer";
    /// Default job name for zip archives.
    pub const DEFAULT_ZIP_DOWNLOADER: &'static str = "prj-wayne-zip-downloader";

    /// Build a catalog of fully-qualified job ids
    /// (`projects/{project}/locations/{region}/jobs/{name}`).
    #[must_use]
    pub fn qualified(
        project_id: &str,
        region: &str,
        file_streamer: &str,
        gz_streamer: &str,
        zip_downloader: &str,
    ) -> Self {
        let qualify = |name: &str| format!("projects/{project_id}/locations/{region}/jobs/{name}");
        Self {
            file_streamer: qualify(file_streamer),
            gz_streamer: qualify(gz_streamer),
            zip_downloader: qualify(zip_downloader),
        }
    }

    /// Catalog using the default job names.
    #[must_use]
    pub fn with_defaults(project_id: &str, region: &str) -> Self {
        Self::qualified(
            project_id,
            region,
            Self::DEFAULT_FILE_STREAMER,
            Self::DEFAULT_GZ_STREAMER,
            Self::DEFAULT_ZIP_DOWNLOADER,
        )
    }

    /// Fully-qualified job id for a target.
    #[must_use]
    pub fn job_id(&self, target: JobTarget) -> &str {
        match target {
            JobTarget::FileStreamer => &self.file_streamer,
            JobTarget::GzStreamer => &self.gz_streamer,
            JobTarget::ZipDownloader => &self.zip_downloader,
        }
    }
}

/// File description stored as the `arguments` of a queued work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkArguments {
    /// Correlation id of the request.
    #[serde(rename = "traceid")]
    pub trace_id: String,
    /// Source URL.
    pub file_url: String,
    /// Last path segment of the URL.
    pub file_name: String,
    /// Whether range requests are supported.
    pub range_supported: bool,
    /// Extension including the leading dot. The misspelt key is what the
    /// queue consumers read.
    #[serde(rename = "fileExtenstion")]
    pub file_extension: String,
    /// Size formatted as `"{:.2} GB"`.
    pub file_size: String,
    /// Raw content type.
    pub content_type: String,
}

impl From<&ProbedFile> for WorkArguments {
    fn from(file: &ProbedFile) -> Self {
        Self {
            trace_id: file.correlation_id.clone(),
            file_url: file.url.clone(),
            file_name: file.file_name.clone(),
            range_supported: file.metadata.range_supported,
            file_extension: file.metadata.extension.clone(),
            file_size: file.metadata.size_display(),
            content_type: file.metadata.content_type.clone(),
        }
    }
}

/// What should happen to a probed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Trigger a streaming job directly.
    StreamJob {
        /// Job to trigger.
        target: JobTarget,
        /// Positional job arguments.
        args: Vec<String>,
    },
    /// Record a work item first, then trigger the job.
    EnqueueThenStream {
        /// Work item payload.
        work: WorkArguments,
        /// Job to trigger after the enqueue succeeds.
        target: JobTarget,
        /// Positional job arguments.
        args: Vec<String>,
    },
    /// Do nothing.
    Skip,
}

/// What was actually done with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A streaming job was triggered.
    Streamed(JobTarget),
    /// A work item was enqueued and then the job was triggered.
    EnqueuedThenStreamed(JobTarget),
    /// The file's type is not handled.
    Skipped,
    /// The dedup store already held the file.
    AlreadyProcessed,
    /// An error stopped the file before dispatch completed.
    NotDispatched,
}

impl Action {
    /// Action a decision produces when every downstream call succeeds.
    #[must_use]
    pub fn planned(decision: &RoutingDecision) -> Self {
        match decision {
            RoutingDecision::StreamJob { target, .. } => Self::Streamed(*target),
            RoutingDecision::EnqueueThenStream { target, .. } => Self::EnqueuedThenStreamed(*target),
            RoutingDecision::Skip => Self::Skipped,
        }
    }

    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Streamed(_) => "streamed",
            Self::EnqueuedThenStreamed(_) => "enqueued_then_streamed",
            Self::Skipped => "skipped",
            Self::AlreadyProcessed => "already_processed",
            Self::NotDispatched => "not_dispatched",
        }
    }
}

/// Descriptor plus the action taken for one URL.
#[derive(Debug)]
pub struct Outcome {
    /// Per-file record.
    pub descriptor: FileDescriptor,
    /// Action taken.
    pub action: Action,
}

impl Outcome {
    /// Whether the file finished with an error.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.descriptor.error.is_some()
    }
}
