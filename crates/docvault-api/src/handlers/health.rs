//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::warn;

use crate::state::AppState;

/// GET /api/health
///
/// Reports `503` while the store cannot be reached.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, store) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!(error = %e, "Store ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    let body = json!({
        "status": if status == StatusCode::OK { "ok" } else { "degraded" },
        "store": store,
        "version": env!("CARGO_PKG_VERSION"),
    });
    (status, Json(body))
}
