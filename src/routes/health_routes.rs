//! Health check endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// 200 while requests can be dispatched; 503 when the configured platform
/// has no implementation.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let dispatcher = &state.dispatcher;
    let status = if dispatcher.platform_available() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": status.canonical_reason().unwrap_or_default(),
            "platform": dispatcher.platform(),
        })),
    )
}
