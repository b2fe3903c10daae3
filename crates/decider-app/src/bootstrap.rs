use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::local::{LoggingJobTrigger, LoggingWorkQueue};
use decider_api::{ApiServer, ApiState};
use decider_config::{Backend, DeciderConfig};
use decider_core::{
    AuditOrigin, AuditSink, BatchCoordinator, DedupStore, Dispatcher, HttpProber, JobCatalog,
    JobTrigger, WorkQueue,
};
use decider_events::EventBus;
use decider_gcp::{
    BigQueryAuditSink, BigQueryTable, BigQueryWorkQueue, CloudRunJobs, GcpClient, GcsDedupStore,
};
use decider_telemetry::{
    DEFAULT_LOG_LEVEL, GlobalContextGuard, LogFormat, LoggingConfig, Metrics, build_sha,
};
use tracing::{info, warn};

/// Dependencies required to bootstrap the decider.
pub(crate) struct BootstrapDependencies {
    config: DeciderConfig,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary entrypoint.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            DeciderConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self { config, telemetry })
    }
}

/// Collaborator adapters selected by the configured backend.
struct Collaborators {
    audit_sink: Arc<dyn AuditSink>,
    trigger: Arc<dyn JobTrigger>,
    queue: Arc<dyn WorkQueue>,
    dedup: Option<Arc<dyn DedupStore>>,
}

/// Entry point for the decider boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, adapter construction, or the
/// API listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies { config, telemetry } = dependencies;

    let logging = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: LogFormat::from_name(config.log_format.as_deref()),
        build_sha: build_sha(),
    };
    decider_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new(config.backend.as_str());

    info!(
        project_id = %config.project_id,
        region = %config.region,
        environment = %config.environment,
        "compute decider bootstrap starting"
    );

    let api = build_server(&config, telemetry)?;
    let addr = config.server.socket_addr();
    info!(addr = %addr, "Launching API listener");

    api.serve(addr, shutdown_signal())
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

/// Wire the collaborators, coordinator, and handler state into a server.
pub(crate) fn build_server(config: &DeciderConfig, telemetry: Metrics) -> AppResult<ApiServer> {
    let collaborators = match config.backend {
        Backend::Gcp => gcp_collaborators(config)?,
        Backend::Local => local_collaborators(),
    };

    let catalog = JobCatalog::qualified(
        &config.project_id,
        &config.region,
        &config.jobs.file_streamer,
        &config.jobs.gz_streamer,
        &config.jobs.zip_downloader,
    );
    let prober = HttpProber::new(config.probe_timeout)
        .map_err(|err| AppError::http_client("probe.client", err))?;
    let dispatcher = Dispatcher::new(collaborators.trigger, collaborators.queue, catalog);

    let mut coordinator = BatchCoordinator::new(Arc::new(prober), dispatcher, telemetry.clone());
    if let Some(store) = collaborators.dedup {
        coordinator = coordinator.with_dedup(store, config.storage.bucket.clone());
    }

    let state = ApiState::new(
        coordinator,
        collaborators.audit_sink,
        AuditOrigin::new(config.environment.clone()),
        telemetry,
    );
    Ok(ApiServer::new(state))
}

fn gcp_collaborators(config: &DeciderConfig) -> AppResult<Collaborators> {
    let client = GcpClient::new(config.collaborator_timeout, config.access_token.clone())
        .map_err(|err| AppError::gcp("gcp.client", err))?;
    let table = |name: &str, operation: &'static str| {
        BigQueryTable::new(
            client.clone(),
            &config.endpoints.bigquery,
            &config.project_id,
            &config.storage.dataset,
            name,
        )
        .map_err(|err| AppError::gcp(operation, err))
    };
    let audit_table = table(&config.storage.audit_table, "bigquery.audit_table")?;
    let queue_table = table(&config.storage.queue_table, "bigquery.queue_table")?;

    let dedup: Option<Arc<dyn DedupStore>> = if config.storage.dedup_enabled {
        Some(Arc::new(GcsDedupStore::new(
            client.clone(),
            config.endpoints.storage.clone(),
        )))
    } else {
        info!("dedup check disabled");
        None
    };

    Ok(Collaborators {
        audit_sink: Arc::new(BigQueryAuditSink::new(audit_table)),
        trigger: Arc::new(CloudRunJobs::new(client, config.endpoints.run.clone())),
        queue: Arc::new(BigQueryWorkQueue::new(queue_table)),
        dedup,
    })
}

fn local_collaborators() -> Collaborators {
    Collaborators {
        audit_sink: Arc::new(EventBus::new()),
        trigger: Arc::new(LoggingJobTrigger),
        queue: Arc::new(LoggingWorkQueue),
        dedup: None,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use decider_test_support::fixtures;

    fn config(backend: &str, dedup: &str) -> DeciderConfig {
        let backend = backend.to_string();
        let dedup = dedup.to_string();
        DeciderConfig::from_lookup(move |name| match name {
            decider_config::loader::PROJECT_ID_VAR => Some("test-project".to_string()),
            decider_config::loader::BACKEND_VAR => Some(backend.clone()),
            decider_config::loader::DEDUP_ENABLED_VAR => Some(dedup.clone()),
            _ => None,
        })
        .expect("config")
    }

    #[test]
    fn local_backend_wires_without_cloud_access() {
        let config = config("local", "false");
        assert_eq!(config.backend, Backend::Local);
        assert!(build_server(&config, fixtures::metrics()).is_ok());
    }

    #[test]
    fn gcp_backend_wires_with_and_without_dedup() {
        for dedup in ["true", "false"] {
            let config = config("gcp", dedup);
            assert_eq!(config.backend, Backend::Gcp);
            assert!(build_server(&config, fixtures::metrics()).is_ok());
        }
    }

    #[test]
    fn missing_project_is_a_config_error() {
        let err = DeciderConfig::from_lookup(|_| None)
            .map_err(|err| AppError::config("config.from_env", err))
            .expect_err("project id is required");
        assert!(matches!(err, AppError::Config { .. }));
    }
}
