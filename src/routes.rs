// HTTP surface: a couple of fixed routes plus a catch-all that funnels the
// whole /redfish/v1 tree through the aggregator.

use crate::aggregator::RedfishAggregator;
use crate::local::LocalTree;
use crate::version;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use std::sync::Arc;

/// Requests bigger than this are rejected before aggregation.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub fn app(aggregator: Arc<RedfishAggregator>, local: Arc<LocalTree>) -> Router {
    let state = AppState { aggregator, local };
    Router::new()
        .route("/redfish", get(redfish_versions))
        .route("/version", get(version_info))
        .fallback(redfish_handler)
        .with_state(state)
}

#[derive(Clone)]
struct AppState {
    aggregator: Arc<RedfishAggregator>,
    local: Arc<LocalTree>,
}

async fn redfish_versions() -> impl IntoResponse {
    Json(json!({ "v1": "/redfish/v1/" }))
}

async fn version_info() -> impl IntoResponse {
    Json(json!({ "name": version::NAME, "version": version::VERSION }))
}

async fn redfish_handler(State(state): State<AppState>, request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, path = %parts.uri.path(), "rejecting oversized request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };
    state
        .aggregator
        .handle(&parts, bytes, &state.local)
        .await
        .into_response()
}
