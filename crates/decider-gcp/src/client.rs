//! Shared HTTP client for Google Cloud REST calls.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use crate::error::{GcpError, GcpResult};

const MAX_ERROR_BODY: usize = 512;

/// HTTP client plus optional bearer token, shared by every adapter.
#[derive(Clone)]
pub struct GcpClient {
    http: Client,
    access_token: Option<String>,
}

impl GcpClient {
    /// Build a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GcpError::Client`] if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration, access_token: Option<String>) -> GcpResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GcpError::Client { source })?;
        Ok(Self { http, access_token })
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.post(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Append `segments` to `base`, percent-encoding each one (including `/`).
///
/// # Errors
///
/// Returns [`GcpError::InvalidEndpoint`] when `base` cannot carry a path.
pub fn endpoint(base: &Url, segments: &[&str]) -> GcpResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| GcpError::InvalidEndpoint {
                endpoint: base.to_string(),
            })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Send `request`, mapping transport failures and non-success statuses.
pub(crate) async fn send(operation: &'static str, request: RequestBuilder) -> GcpResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|source| GcpError::Request { operation, source })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(status_error(operation, response).await)
}

pub(crate) async fn status_error(operation: &'static str, response: Response) -> GcpError {
    let status = response.status().as_u16();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    GcpError::Status {
        operation,
        status,
        body,
    }
}
