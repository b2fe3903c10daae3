//! HEAD-request prober that learns file metadata without downloading.
//!
//! # Design
//! - The URL path wins for the extension; the `Content-Type` subtype is the
//!   fallback when the path has none.
//! - `Content-Length` is read from the raw header, as HEAD responses carry no
//!   body for the client to measure.

use std::time::Duration;

use async_trait::async_trait;
use decider_events::{AuditEventKind, AuditStatus};
use percent_encoding::percent_decode_str;
use reqwest::Client;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::audit::Auditor;
use crate::error::DecisionError;
use crate::model::{BatchContext, FileMetadata, ProbedFile};
use crate::service::Prober;

/// Non-success status returned by a probed server.
#[derive(Debug, Error)]
#[error("unexpected status {status}")]
pub struct UnexpectedStatus {
    /// HTTP status code.
    pub status: u16,
}

/// [`Prober`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    /// Build a prober whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn inspect(&self, url: &str, batch: &BatchContext) -> Result<ProbedFile, DecisionError> {
        let parsed = Url::parse(url).map_err(|source| DecisionError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let file_name = file_name_from_path(parsed.path());
        let path_ext = path_extension(parsed.path());

        let response = self
            .client
            .head(parsed)
            .send()
            .await
            .map_err(|err| DecisionError::ProbeFailed {
                url: url.to_string(),
                source: Box::new(err),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(DecisionError::ProbeFailed {
                url: url.to_string(),
                source: Box::new(UnexpectedStatus {
                    status: status.as_u16(),
                }),
            });
        }

        let metadata = metadata_from_headers(url, &path_ext, response.headers())?;
        Ok(ProbedFile {
            url: url.to_string(),
            file_name,
            batch_id: batch.batch_id.clone(),
            correlation_id: batch.correlation_id.clone(),
            metadata,
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(
        &self,
        url: &str,
        batch: &BatchContext,
        audit: &Auditor,
    ) -> Result<ProbedFile, DecisionError> {
        audit
            .record(
                AuditEventKind::AnalyzeFileStarted,
                AuditStatus::Started,
                Some(url),
                "",
            )
            .await;

        match self.inspect(url, batch).await {
            Ok(file) => {
                debug!(
                    url,
                    extension = %file.metadata.extension,
                    size_bytes = file.metadata.size_bytes,
                    "probed file"
                );
                audit
                    .record(
                        AuditEventKind::AnalyzeFileCompleted,
                        AuditStatus::Completed,
                        Some(url),
                        format!(
                            "extension={} size={} content_type={}",
                            file.metadata.extension,
                            file.metadata.size_display(),
                            file.metadata.content_type
                        ),
                    )
                    .await;
                Ok(file)
            }
            Err(err) => {
                audit
                    .record(
                        AuditEventKind::AnalyzeFileFailed,
                        AuditStatus::Failed,
                        Some(url),
                        err.describe(),
                    )
                    .await;
                Err(err)
            }
        }
    }
}

/// Build metadata from HEAD response headers.
///
/// # Errors
///
/// Returns [`DecisionError::SizeUnavailable`] when `Content-Length` is missing
/// or not a non-negative integer.
pub fn metadata_from_headers(
    url: &str,
    path_ext: &str,
    headers: &HeaderMap,
) -> Result<FileMetadata, DecisionError> {
    let raw_length = headers
        .get(CONTENT_LENGTH)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    let size_bytes = raw_length
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .ok_or_else(|| DecisionError::SizeUnavailable {
            url: url.to_string(),
            value: raw_length.clone(),
        })?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let range_supported = headers
        .get(ACCEPT_RANGES)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "bytes");

    let extension = if path_ext.is_empty() {
        extension_from_content_type(&content_type).unwrap_or_default()
    } else {
        path_ext.to_string()
    };

    Ok(FileMetadata {
        size_bytes,
        extension,
        content_type,
        range_supported,
    })
}

/// Suffix of the last decoded path segment starting at its final `.`, or empty.
#[must_use]
pub fn path_extension(path: &str) -> String {
    let decoded = decode(path);
    let segment = decoded.rsplit('/').next().unwrap_or_default();
    segment
        .rfind('.')
        .map(|idx| segment[idx..].to_string())
        .unwrap_or_default()
}

/// Last non-empty decoded path segment; `/` for a bare root and `.` for an
/// empty path.
#[must_use]
pub fn file_name_from_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let decoded = decode(path);
    let trimmed = decoded.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

/// File name of a raw URL, if the URL parses.
#[must_use]
pub fn file_name_from_url(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .map(|parsed| file_name_from_path(parsed.path()))
}

/// `.{subtype}` for a `type/subtype` media type; parameters are ignored.
#[must_use]
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.split('/').collect::<Vec<_>>().as_slice() {
        [kind, subtype] if !kind.is_empty() && !subtype.is_empty() => Some(format!(".{subtype}")),
        _ => None,
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditOrigin;
    use decider_events::EventBus;
    use httpmock::MockServer;
    use httpmock::Method::HEAD;
    use reqwest::header::HeaderValue;
    use std::sync::Arc;

    fn headers(pairs: &[(reqwest::header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).expect("header"));
        }
        map
    }

    fn batch() -> BatchContext {
        BatchContext::for_request("corr-1")
    }

    fn auditor(bus: &EventBus) -> Auditor {
        Auditor::new(Arc::new(bus.clone()), AuditOrigin::new("DEV"), "corr-1")
    }

    #[test]
    fn path_helpers_follow_last_segment() {
        assert_eq!(path_extension("/data/file.tar.gz"), ".gz");
        assert_eq!(path_extension("/data.v1/file"), "");
        assert_eq!(path_extension("/y/file"), "");
        assert_eq!(file_name_from_path("/data/a.zip"), "a.zip");
        assert_eq!(file_name_from_path("/data/dir/"), "dir");
        assert_eq!(file_name_from_path("/"), "/");
        assert_eq!(file_name_from_path("/my%20file.json"), "my file.json");
    }

    #[test]
    fn encoded_dot_is_decoded_before_the_extension_is_taken() {
        assert_eq!(path_extension("/y/a%2Ejson"), ".json");
        assert_eq!(file_name_from_path("/y/a%2Ejson"), "a.json");
        assert_eq!(path_extension("/y/archive%2ezip"), ".zip");
    }

    #[test]
    fn content_type_fallback_requires_two_parts() {
        assert_eq!(
            extension_from_content_type("application/json").as_deref(),
            Some(".json")
        );
        assert_eq!(
            extension_from_content_type("application/json; charset=utf-8").as_deref(),
            Some(".json")
        );
        assert_eq!(extension_from_content_type("garbage"), None);
        assert_eq!(extension_from_content_type("a/b/c"), None);
        assert_eq!(extension_from_content_type(""), None);
    }

    #[test]
    fn extensionless_path_uses_content_type() {
        let map = headers(&[
            (CONTENT_LENGTH, "1073741824"),
            (CONTENT_TYPE, "application/json"),
        ]);
        let meta = metadata_from_headers("https://x/y/file", "", &map).expect("metadata");
        assert_eq!(meta.extension, ".json");
        assert_eq!(meta.size_display(), "1.00 GB");
        assert!(!meta.range_supported);
    }

    #[test]
    fn path_extension_wins_over_content_type() {
        let map = headers(&[
            (CONTENT_LENGTH, "10"),
            (CONTENT_TYPE, "application/json"),
            (ACCEPT_RANGES, "bytes"),
        ]);
        let meta = metadata_from_headers("https://x/a.zip", ".zip", &map).expect("metadata");
        assert_eq!(meta.extension, ".zip");
        assert!(meta.range_supported);
    }

    #[test]
    fn bad_content_length_is_size_unavailable() {
        let missing = metadata_from_headers("https://x/a.json", ".json", &HeaderMap::new());
        assert!(matches!(
            missing,
            Err(DecisionError::SizeUnavailable { value: None, .. })
        ));

        let garbled = headers(&[(CONTENT_LENGTH, "abc")]);
        let err = metadata_from_headers("https://x/a.json", ".json", &garbled)
            .expect_err("non-numeric length");
        assert!(matches!(
            err,
            DecisionError::SizeUnavailable { value: Some(ref raw), .. } if raw == "abc"
        ));
    }

    #[tokio::test]
    async fn probe_reads_head_response() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(HEAD).path("/data/a.gz");
            then.status(200)
                .header("content-length", "2048")
                .header("accept-ranges", "bytes")
                .header("content-type", "application/gzip");
        });

        let bus = EventBus::new();
        let prober = HttpProber::new(Duration::from_secs(5)).expect("client");
        let url = server.url("/data/a.gz");
        let file = prober
            .probe(&url, &batch(), &auditor(&bus))
            .await
            .expect("probe");

        mock.assert();
        assert_eq!(file.file_name, "a.gz");
        assert_eq!(file.metadata.extension, ".gz");
        assert_eq!(file.metadata.size_bytes, 2048);
        assert!(file.metadata.range_supported);
        let kinds: Vec<_> = bus.recorded().into_iter().map(|e| e.event).collect();
        assert_eq!(
            kinds,
            vec![
                AuditEventKind::AnalyzeFileStarted,
                AuditEventKind::AnalyzeFileCompleted
            ]
        );
    }

    #[tokio::test]
    async fn non_success_status_is_probe_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(HEAD).path("/missing.json");
            then.status(404);
        });

        let bus = EventBus::new();
        let prober = HttpProber::new(Duration::from_secs(5)).expect("client");
        let err = prober
            .probe(&server.url("/missing.json"), &batch(), &auditor(&bus))
            .await
            .expect_err("404 must fail");

        assert_eq!(err.kind(), "probe_failed");
        assert!(err.describe().contains("unexpected status 404"));
        let last = bus.recorded().pop().expect("audit event");
        assert_eq!(last.event, AuditEventKind::AnalyzeFileFailed);
        assert_eq!(last.status, AuditStatus::Failed);
    }

    #[tokio::test]
    async fn unparsable_url_fails_without_network() {
        let bus = EventBus::new();
        let prober = HttpProber::new(Duration::from_secs(1)).expect("client");
        let err = prober
            .probe("not a url", &batch(), &auditor(&bus))
            .await
            .expect_err("invalid url");
        assert_eq!(err.kind(), "invalid_url");
    }
}
