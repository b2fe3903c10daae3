//! Health and diagnostics endpoints.

use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::StatusCode, response::Response};
use tracing::error;

use crate::http::errors::ApiError;
use crate::models::HealthResponse;
use crate::state::ApiState;

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use decider_core::AuditOrigin;
    use decider_events::EventBus;
    use decider_test_support::fixtures;
    use decider_test_support::mocks::{
        CallLog, RecordingJobTrigger, RecordingWorkQueue, ScriptedProber,
    };

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn metrics_render_prometheus_text() {
        let log = CallLog::new();
        let telemetry = fixtures::metrics();
        telemetry.inc_http_request("/v1/analyze", 200);
        let state = Arc::new(ApiState::new(
            fixtures::coordinator(
                ScriptedProber::new(log.clone()),
                RecordingJobTrigger::new(log.clone()),
                RecordingWorkQueue::new(log),
            ),
            Arc::new(EventBus::new()),
            AuditOrigin::new("DEV"),
            telemetry,
        ));

        let response = metrics(State(state)).await.expect("metrics response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let text = String::from_utf8(body.to_vec()).expect("utf-8");
        assert!(text.contains("http_requests_total"));
    }
}
