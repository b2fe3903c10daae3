//! Per-request middleware: scopes the correlation id and counts responses.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use decider_telemetry::with_request_context;

use crate::http::constants::HEADER_REQUEST_ID;
use crate::state::ApiState;

/// Run the handler with the request's `x-request-id` as its correlation id,
/// then count the response under the matched route and status.
pub(crate) async fn track_request(
    State(state): State<Arc<ApiState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path().to_owned(), |matched| matched.as_str().to_owned());
    let correlation_id = req
        .headers()
        .get(HEADER_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let response = with_request_context(correlation_id, next.run(req)).await;
    state
        .telemetry
        .inc_http_request(&route, response.status().as_u16());
    response
}
