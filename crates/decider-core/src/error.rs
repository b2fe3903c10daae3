//! Error types for the decision pipeline.

use std::error::Error;
use std::fmt::Write as _;

use thiserror::Error;

/// Boxed error used for collaborator failures.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Per-file failure recorded on a descriptor.
///
/// None of these abort a batch; they travel with the file they concern.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// The URL could not be parsed.
    #[error("invalid URL {url}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The HEAD request failed or returned a non-success status.
    #[error("failed to execute HEAD request for {url}")]
    ProbeFailed {
        /// Probed URL.
        url: String,
        /// Transport or status failure.
        #[source]
        source: BoxError,
    },
    /// The response carried no usable `Content-Length`.
    #[error("content length unavailable for {url}")]
    SizeUnavailable {
        /// Probed URL.
        url: String,
        /// Raw header value when one was present.
        value: Option<String>,
    },
    /// The dedup store could not answer.
    #[error("failed to check whether {url} was already processed")]
    DedupCheckFailed {
        /// Subject URL.
        url: String,
        /// Store failure.
        #[source]
        source: BoxError,
    },
    /// The downstream job could not be triggered.
    #[error("failed to trigger job {job_id} for {url}")]
    TriggerFailed {
        /// Subject URL.
        url: String,
        /// Fully-qualified job id.
        job_id: String,
        /// Trigger failure.
        #[source]
        source: BoxError,
    },
    /// The work item could not be enqueued.
    #[error("failed to enqueue work item for {url}")]
    EnqueueFailed {
        /// Subject URL.
        url: String,
        /// Queue failure.
        #[source]
        source: BoxError,
    },
    /// The work item could not be serialised.
    #[error("failed to serialize work item for {url}")]
    SerializationFailed {
        /// Subject URL.
        url: String,
        /// Serializer failure.
        #[source]
        source: serde_json::Error,
    },
}

impl DecisionError {
    /// Stable label used for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::ProbeFailed { .. } => "probe_failed",
            Self::SizeUnavailable { .. } => "size_unavailable",
            Self::DedupCheckFailed { .. } => "dedup_check_failed",
            Self::TriggerFailed { .. } => "trigger_failed",
            Self::EnqueueFailed { .. } => "enqueue_failed",
            Self::SerializationFailed { .. } => "serialization_failed",
        }
    }

    /// URL the failure concerns.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::ProbeFailed { url, .. }
            | Self::SizeUnavailable { url, .. }
            | Self::DedupCheckFailed { url, .. }
            | Self::TriggerFailed { url, .. }
            | Self::EnqueueFailed { url, .. }
            | Self::SerializationFailed { url, .. } => url,
        }
    }

    /// Human-readable message including every underlying cause.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        if let Self::SizeUnavailable { value, .. } = self {
            match value {
                Some(raw) => {
                    let _ = write!(message, ": non-numeric Content-Length {raw:?}");
                }
                None => message.push_str(": missing Content-Length header"),
            }
        }
        let mut cause = self.source();
        while let Some(err) = cause {
            let _ = write!(message, ": {err}");
            cause = err.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn describe_walks_the_source_chain() {
        let err = DecisionError::TriggerFailed {
            url: "https://h/a.json".into(),
            job_id: "projects/p/locations/r/jobs/j".into(),
            source: Box::new(io::Error::other("quota exceeded")),
        };
        assert_eq!(err.kind(), "trigger_failed");
        assert_eq!(err.url(), "https://h/a.json");
        assert_eq!(
            err.describe(),
            "failed to trigger job projects/p/locations/r/jobs/j for https://h/a.json: quota exceeded"
        );
    }

    #[test]
    fn describe_reports_content_length_problems() {
        let missing = DecisionError::SizeUnavailable {
            url: "https://h/a".into(),
            value: None,
        };
        assert!(missing.describe().ends_with("missing Content-Length header"));

        let garbled = DecisionError::SizeUnavailable {
            url: "https://h/a".into(),
            value: Some("abc".into()),
        };
        assert!(garbled.describe().contains("\"abc\""));
    }
}
