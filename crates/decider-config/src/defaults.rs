//! Built-in configuration values.

/// Cloud Run region.
pub const REGION: &str = "us-central1";
/// Bucket used as the dedup namespace.
pub const BUCKET_NAME: &str = "prj-wayne-media-bucket";
/// BigQuery dataset holding the audit and queue tables.
pub const AUDIT_DATASET: &str = "audit_layer";
/// Audit table.
pub const AUDIT_TABLE: &str = "contact_trace_logs";
/// Work queue table.
pub const QUEUE_TABLE: &str = "contract_file_queue";
/// Job streaming `.json` files.
pub const FILE_STREAMER_JOB: &str = "prj-wayne-file-streamer";
/// Job streaming `.gz` files.
pub const GZ_STREAMER_JOB: &str = "prj-wayne-gz-streamer";
/// Job downloading `.zip` archives.
pub const ZIP_DOWNLOADER_JOB: &str = "prj-wayne-zip-downloader";
/// Environment tag stamped on audit records.
pub const ENVIRONMENT: &str = "DEV";
/// Listener address.
pub const BIND_ADDR: &str = "0.0.0.0";
/// Listener port.
pub const PORT: u16 = 8080;
/// HEAD probe timeout in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 30;
/// Collaborator request timeout in seconds.
pub const COLLABORATOR_TIMEOUT_SECS: u64 = 10;
/// Cloud Run Admin API base URL.
pub const RUN_ENDPOINT: &str = "https://run.googleapis.com";
/// BigQuery API base URL.
pub const BIGQUERY_ENDPOINT: &str = "https://bigquery.googleapis.com";
/// Cloud Storage JSON API base URL.
pub const STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
