//! Typed configuration consumed by the bootstrap.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

/// Which collaborator adapters to wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Google Cloud REST adapters.
    Gcp,
    /// In-memory audit bus and log-only dispatch, for local runs.
    Local,
}

impl Backend {
    /// Label used in logs and spans.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gcp => "gcp",
            Self::Local => "local",
        }
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Bind address.
    pub bind_addr: IpAddr,
    /// Port.
    pub port: u16,
}

impl ServerSettings {
    /// Socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Deployed job names per target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNames {
    /// `.json` job.
    pub file_streamer: String,
    /// `.gz` job.
    pub gz_streamer: String,
    /// `.zip` job.
    pub zip_downloader: String,
}

/// Dedup bucket and BigQuery table locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Bucket queried for already-processed files.
    pub bucket: String,
    /// Whether the dedup check runs at all.
    pub dedup_enabled: bool,
    /// Dataset holding both tables.
    pub dataset: String,
    /// Audit table.
    pub audit_table: String,
    /// Work queue table.
    pub queue_table: String,
}

/// API base URLs; overridable for emulators and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Cloud Run Admin API.
    pub run: Url,
    /// BigQuery API.
    pub bigquery: Url,
    /// Cloud Storage JSON API.
    pub storage: Url,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeciderConfig {
    /// Project owning the jobs and tables.
    pub project_id: String,
    /// Region the jobs run in.
    pub region: String,
    /// Environment tag stamped on audit records.
    pub environment: String,
    /// Adapter selection.
    pub backend: Backend,
    /// Listener settings.
    pub server: ServerSettings,
    /// Job names.
    pub jobs: JobNames,
    /// Bucket and table locations.
    pub storage: StorageSettings,
    /// API base URLs.
    pub endpoints: Endpoints,
    /// Bearer token for outbound calls, when not relying on ambient credentials.
    pub access_token: Option<String>,
    /// HEAD probe timeout.
    pub probe_timeout: Duration,
    /// Timeout for every collaborator request.
    pub collaborator_timeout: Duration,
    /// Requested log format name, if any.
    pub log_format: Option<String>,
}
