//! API handlers for the release feed.

use axum::extract::State;
use axum::response::Json;
use serde_json::json;
use shinbun_core::response::{WireResponse, encode};

use crate::server::AppState;

/// Computes a fresh snapshot and serves it in the dashboard's two-shape
/// contract: a JSON array of releases, or `{"error": ...}` when there is
/// nothing to show. Always HTTP 200.
pub async fn api_releases(State(state): State<AppState>) -> Json<WireResponse> {
    let result = state.aggregator.refresh().await;
    Json(encode(result))
}

/// Liveness probe for the dashboard and deploy tooling.
pub async fn api_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
