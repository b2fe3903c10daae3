//! Wire DTOs for the analyze endpoint and problem responses.

use decider_core::Outcome;
use serde::{Deserialize, Serialize};

/// Body of `POST /` and `POST /v1/analyze`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    /// URLs to analyze, in order.
    #[serde(rename = "fileUrl", default)]
    pub file_urls: Option<Vec<String>>,
    /// Caller-supplied batch id; namespaces dedup keys.
    #[serde(rename = "requestUUID", default)]
    pub request_uuid: Option<String>,
}

/// Per-URL entry of the analyze response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    /// Correlation id of the request.
    #[serde(rename = "traceid")]
    pub trace_id: String,
    /// URL exactly as submitted.
    pub file_url: String,
    /// Last path segment of the URL.
    pub file_name: String,
    /// Whether the server supports range requests.
    pub range_supported: bool,
    /// Extension including the leading dot. Misspelt on the wire for
    /// compatibility with existing consumers.
    #[serde(rename = "fileExtenstion")]
    pub file_extension: String,
    /// Size formatted as `"{:.2} GB"`, empty when unknown.
    pub file_size: String,
    /// Raw content type.
    pub content_type: String,
    /// Action taken for the file.
    pub action: &'static str,
    /// Failure message, `null` on success.
    pub error: Option<String>,
}

impl From<&Outcome> for FileResult {
    fn from(outcome: &Outcome) -> Self {
        let descriptor = &outcome.descriptor;
        let metadata = descriptor.metadata.as_ref();
        Self {
            trace_id: descriptor.correlation_id.clone(),
            file_url: descriptor.url.clone(),
            file_name: descriptor.file_name.clone(),
            range_supported: metadata.is_some_and(|m| m.range_supported),
            file_extension: metadata.map(|m| m.extension.clone()).unwrap_or_default(),
            file_size: metadata.map(|m| m.size_display()).unwrap_or_default(),
            content_type: metadata.map(|m| m.content_type.clone()).unwrap_or_default(),
            action: outcome.action.as_str(),
            error: descriptor.error_message(),
        }
    }
}

/// RFC 9457 problem document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use decider_core::{Action, BatchContext, FileDescriptor, FileMetadata, JobTarget};
    use serde_json::json;

    #[test]
    fn request_accepts_missing_fields() {
        let request: AnalyzeRequest = serde_json::from_str("{}").expect("parse");
        assert!(request.file_urls.is_none());
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"fileUrl":["https://h/a.json"],"requestUUID":"r-1"}"#)
                .expect("parse");
        assert_eq!(request.file_urls.as_deref(), Some(&["https://h/a.json".to_string()][..]));
        assert_eq!(request.request_uuid.as_deref(), Some("r-1"));
    }

    #[test]
    fn file_result_uses_wire_names() {
        let batch = BatchContext::for_request("corr");
        let mut descriptor = FileDescriptor::unprobed("https://h/a.gz", &batch, Some("a.gz".into()));
        descriptor.metadata = Some(FileMetadata {
            size_bytes: 1_073_741_824,
            extension: ".gz".into(),
            content_type: "application/gzip".into(),
            range_supported: true,
        });
        let outcome = Outcome {
            descriptor,
            action: Action::Streamed(JobTarget::GzStreamer),
        };

        let value = serde_json::to_value(FileResult::from(&outcome)).expect("serialise");
        assert_eq!(
            value,
            json!({
                "traceid": "corr",
                "fileUrl": "https://h/a.gz",
                "fileName": "a.gz",
                "rangeSupported": true,
                "fileExtenstion": ".gz",
                "fileSize": "1.00 GB",
                "contentType": "application/gzip",
                "action": "streamed",
                "error": null
            })
        );
    }
}
