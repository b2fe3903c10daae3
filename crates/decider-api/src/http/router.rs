//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::Request,
    middleware,
    routing::{get, post},
};
use decider_telemetry::build_sha;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::analyze::analyze;
use crate::http::constants::HEADER_REQUEST_ID;
use crate::http::health::{health, metrics};
use crate::http::telemetry::track_request;
use crate::state::ApiState;

/// Axum router wrapper that hosts the decider API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct the server around shared handler state.
    #[must_use]
    pub fn new(state: ApiState) -> Self {
        let state = Arc::new(state);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(decider_telemetry::set_request_id_layer())
            .layer(decider_telemetry::propagate_request_id_layer())
            .layer(trace_layer)
            .layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                track_request,
            ));

        let router = Router::new()
            .route("/", post(analyze))
            .route("/v1/analyze", post(analyze))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    /// Bind `addr` and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        tracing::info!("Starting API on {}", addr);
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }

    #[cfg(test)]
    pub(crate) const fn router(&self) -> &Router {
        &self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decider_core::AuditOrigin;
    use decider_events::EventBus;
    use decider_test_support::fixtures;
    use decider_test_support::mocks::{
        CallLog, RecordingJobTrigger, RecordingWorkQueue, ScriptedProber,
    };

    fn server() -> ApiServer {
        let log = CallLog::new();
        let coordinator = fixtures::coordinator(
            ScriptedProber::new(log.clone()),
            RecordingJobTrigger::new(log.clone()),
            RecordingWorkQueue::new(log),
        );
        ApiServer::new(ApiState::new(
            coordinator,
            Arc::new(EventBus::new()),
            AuditOrigin::new("DEV"),
            fixtures::metrics(),
        ))
    }

    #[test]
    fn router_builds_with_every_route() {
        let server = server();
        let _router = server.router().clone();
    }

    #[tokio::test]
    async fn serve_reports_bind_failures() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.expect("listener");
        let addr = occupied.local_addr().expect("addr");
        let err = server()
            .serve(addr, async {})
            .await
            .expect_err("address in use");
        assert!(matches!(err, ApiServerError::Bind { .. }));
    }
}
