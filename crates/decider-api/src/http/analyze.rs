//! Batch analyze endpoint.
//!
//! # Design
//! - The request id doubles as the correlation id stamped on audit records and
//!   passed to downstream jobs.
//! - Per-file failures never short-circuit the batch; any failure turns the
//!   whole response into a `500` that still carries every per-file result.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
};
use decider_core::BatchContext;
use decider_events::{AuditEventKind, AuditStatus};
use decider_telemetry::current_request_id;
use tracing::{info, warn};
use uuid::Uuid;

use crate::http::errors::ApiError;
use crate::models::{AnalyzeRequest, FileResult};
use crate::state::ApiState;

pub(crate) async fn analyze(
    State(state): State<Arc<ApiState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Vec<FileResult>>), ApiError> {
    let correlation_id = current_request_id()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let audit = state.auditor(correlation_id.clone());
    audit
        .record(
            AuditEventKind::ApplicationStarted,
            AuditStatus::Started,
            None,
            "",
        )
        .await;

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let detail = format!("failed to read request body: {rejection}");
            audit
                .record(
                    AuditEventKind::RequestBodyFailed,
                    AuditStatus::Failed,
                    None,
                    detail.clone(),
                )
                .await;
            return Err(ApiError::bad_request(detail));
        }
    };

    let request: AnalyzeRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            let detail = format!("invalid JSON format: {err}");
            audit
                .record(
                    AuditEventKind::InvalidJsonFormat,
                    AuditStatus::Failed,
                    None,
                    detail.clone(),
                )
                .await;
            return Err(ApiError::bad_request(detail));
        }
    };

    let urls = request.file_urls.unwrap_or_default();
    if urls.is_empty() {
        audit
            .record(
                AuditEventKind::FileUrlMissing,
                AuditStatus::Failed,
                None,
                "fileUrl is required",
            )
            .await;
        return Err(ApiError::bad_request("fileUrl is required"));
    }

    let batch = BatchContext {
        batch_id: request
            .request_uuid
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| correlation_id.clone()),
        correlation_id,
    };

    let outcomes = state
        .coordinator
        .process_batch(&urls, &batch, &audit)
        .await;

    let mut failures = 0_usize;
    for outcome in outcomes.iter().filter(|outcome| outcome.is_failure()) {
        failures += 1;
        audit
            .record(
                AuditEventKind::ErrorFetchingFileSize,
                AuditStatus::Failed,
                Some(&outcome.descriptor.url),
                outcome.descriptor.error_message().unwrap_or_default(),
            )
            .await;
    }
    let results: Vec<FileResult> = outcomes.iter().map(FileResult::from).collect();

    audit
        .record(
            AuditEventKind::ApplicationCompleted,
            AuditStatus::Completed,
            None,
            format!("processed {} files, {failures} failed", results.len()),
        )
        .await;

    if failures > 0 {
        warn!(batch_id = %batch.batch_id, failures, "error fetching file size");
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(results)));
    }
    info!(batch_id = %batch.batch_id, files = results.len(), "batch analyzed");
    Ok((StatusCode::OK, Json(results)))
}
