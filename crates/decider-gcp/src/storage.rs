//! Cloud Storage object lookups used for dedup.

use async_trait::async_trait;
use decider_core::DedupStore;
use reqwest::StatusCode;
use url::Url;

use crate::client::{GcpClient, endpoint, status_error};
use crate::error::{GcpError, GcpResult};

/// Answers "does `bucket/key` exist?" through the JSON API object metadata.
#[derive(Clone)]
pub struct GcsDedupStore {
    client: GcpClient,
    base: Url,
}

impl GcsDedupStore {
    /// Store against the JSON API at `base`.
    #[must_use]
    pub const fn new(client: GcpClient, base: Url) -> Self {
        Self { client, base }
    }

    /// `{base}/storage/v1/b/{bucket}/o/{key}` with `key` encoded as one segment.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot carry a path.
    pub fn object_url(&self, bucket: &str, key: &str) -> GcpResult<Url> {
        endpoint(&self.base, &["storage", "v1", "b", bucket, "o", key])
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> GcpResult<bool> {
        let response = self
            .client
            .get(self.object_url(bucket, key)?)
            .send()
            .await
            .map_err(|source| GcpError::Request {
                operation: "storage.objects.get",
                source,
            })?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error("storage.objects.get", response).await),
        }
    }
}

#[async_trait]
impl DedupStore for GcsDedupStore {
    async fn exists(&self, namespace: &str, key: &str) -> anyhow::Result<bool> {
        Ok(self.object_exists(namespace, key).await?)
    }
}
