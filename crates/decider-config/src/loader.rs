//! Environment parsing for [`DeciderConfig`].

use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{Backend, DeciderConfig, Endpoints, JobNames, ServerSettings, StorageSettings};

/// Project owning the jobs and tables (required).
pub const PROJECT_ID_VAR: &str = "GCP_PROJECT_ID";
/// Cloud Run region.
pub const REGION_VAR: &str = "DECIDER_REGION";
/// Dedup bucket.
pub const BUCKET_VAR: &str = "BUCKET_NAME";
/// Dedup toggle.
pub const DEDUP_ENABLED_VAR: &str = "DECIDER_DEDUP_ENABLED";
/// BigQuery dataset.
pub const AUDIT_DATASET_VAR: &str = "DECIDER_AUDIT_DATASET";
/// Audit table.
pub const AUDIT_TABLE_VAR: &str = "DECIDER_AUDIT_TABLE";
/// Work queue table.
pub const QUEUE_TABLE_VAR: &str = "DECIDER_QUEUE_TABLE";
/// `.json` job name.
pub const FILE_STREAMER_JOB_VAR: &str = "DECIDER_FILE_STREAMER_JOB";
/// `.gz` job name.
pub const GZ_STREAMER_JOB_VAR: &str = "DECIDER_GZ_STREAMER_JOB";
/// `.zip` job name.
pub const ZIP_DOWNLOADER_JOB_VAR: &str = "DECIDER_ZIP_DOWNLOADER_JOB";
/// Audit environment tag.
pub const ENVIRONMENT_VAR: &str = "DECIDER_ENVIRONMENT";
/// Listener address.
pub const BIND_ADDR_VAR: &str = "DECIDER_BIND_ADDR";
/// Listener port.
pub const PORT_VAR: &str = "PORT";
/// HEAD probe timeout in seconds.
pub const PROBE_TIMEOUT_VAR: &str = "DECIDER_PROBE_TIMEOUT_SECS";
/// Collaborator timeout in seconds.
pub const COLLABORATOR_TIMEOUT_VAR: &str = "DECIDER_COLLABORATOR_TIMEOUT_SECS";
/// Adapter selection (`gcp` or `local`).
pub const BACKEND_VAR: &str = "DECIDER_BACKEND";
/// Bearer token for outbound calls.
pub const ACCESS_TOKEN_VAR: &str = "DECIDER_GCP_ACCESS_TOKEN";
/// Cloud Run Admin API override.
pub const RUN_ENDPOINT_VAR: &str = "DECIDER_RUN_ENDPOINT";
/// BigQuery API override.
pub const BIGQUERY_ENDPOINT_VAR: &str = "DECIDER_BIGQUERY_ENDPOINT";
/// Cloud Storage API override.
pub const STORAGE_ENDPOINT_VAR: &str = "DECIDER_STORAGE_ENDPOINT";
/// Log format (`json` or `pretty`).
pub const LOG_FORMAT_VAR: &str = "DECIDER_LOG_FORMAT";

impl DeciderConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value is invalid.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let project_id = env
            .get(PROJECT_ID_VAR)
            .ok_or(ConfigError::MissingField {
                field: PROJECT_ID_VAR,
            })?;
        let backend = match env.get(BACKEND_VAR) {
            None => Backend::Gcp,
            Some(value) => parse_backend(&value)?,
        };
        let bind_addr = env
            .get(BIND_ADDR_VAR)
            .unwrap_or_else(|| defaults::BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidField {
                field: BIND_ADDR_VAR,
                value: bind_addr.clone(),
                reason: "must be an IP address",
            })?;
        let port = match env.get(PORT_VAR) {
            None => defaults::PORT,
            Some(value) => parse_port(&value)?,
        };

        Ok(Self {
            project_id,
            region: env.or(REGION_VAR, defaults::REGION),
            environment: env.or(ENVIRONMENT_VAR, defaults::ENVIRONMENT),
            backend,
            server: ServerSettings { bind_addr, port },
            jobs: JobNames {
                file_streamer: env.or(FILE_STREAMER_JOB_VAR, defaults::FILE_STREAMER_JOB),
                gz_streamer: env.or(GZ_STREAMER_JOB_VAR, defaults::GZ_STREAMER_JOB),
                zip_downloader: env.or(ZIP_DOWNLOADER_JOB_VAR, defaults::ZIP_DOWNLOADER_JOB),
            },
            storage: StorageSettings {
                bucket: env.or(BUCKET_VAR, defaults::BUCKET_NAME),
                dedup_enabled: match env.get(DEDUP_ENABLED_VAR) {
                    None => true,
                    Some(value) => parse_flag(DEDUP_ENABLED_VAR, &value)?,
                },
                dataset: env.or(AUDIT_DATASET_VAR, defaults::AUDIT_DATASET),
                audit_table: env.or(AUDIT_TABLE_VAR, defaults::AUDIT_TABLE),
                queue_table: env.or(QUEUE_TABLE_VAR, defaults::QUEUE_TABLE),
            },
            endpoints: Endpoints {
                run: env.url(RUN_ENDPOINT_VAR, defaults::RUN_ENDPOINT)?,
                bigquery: env.url(BIGQUERY_ENDPOINT_VAR, defaults::BIGQUERY_ENDPOINT)?,
                storage: env.url(STORAGE_ENDPOINT_VAR, defaults::STORAGE_ENDPOINT)?,
            },
            access_token: env.get(ACCESS_TOKEN_VAR),
            probe_timeout: env.seconds(PROBE_TIMEOUT_VAR, defaults::PROBE_TIMEOUT_SECS)?,
            collaborator_timeout: env
                .seconds(COLLABORATOR_TIMEOUT_VAR, defaults::COLLABORATOR_TIMEOUT_SECS)?,
            log_format: env.get(LOG_FORMAT_VAR),
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn url(&self, name: &'static str, default: &str) -> ConfigResult<Url> {
        let raw = self.or(name, default);
        let url = Url::parse(&raw).map_err(|_| ConfigError::InvalidField {
            field: name,
            value: raw.clone(),
            reason: "must be an absolute URL",
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidField {
                field: name,
                value: raw,
                reason: "must be an absolute URL",
            });
        }
        Ok(url)
    }

    fn seconds(&self, name: &'static str, default: u64) -> ConfigResult<Duration> {
        let Some(raw) = self.get(name) else {
            return Ok(Duration::from_secs(default));
        };
        match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidField {
                field: name,
                value: raw,
                reason: "must be a positive number of seconds",
            }),
        }
    }
}

fn parse_backend(value: &str) -> ConfigResult<Backend> {
    match value.to_ascii_lowercase().as_str() {
        "gcp" => Ok(Backend::Gcp),
        "local" => Ok(Backend::Local),
        _ => Err(ConfigError::InvalidField {
            field: BACKEND_VAR,
            value: value.to_string(),
            reason: "must be 'gcp' or 'local'",
        }),
    }
}

fn parse_port(value: &str) -> ConfigResult<u16> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidField {
            field: PORT_VAR,
            value: value.to_string(),
            reason: "must be between 1 and 65535",
        }),
    }
}

fn parse_flag(field: &'static str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidField {
            field,
            value: value.to_string(),
            reason: "must be a boolean flag",
        }),
    }
}
