//! Health check handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let store = state.store.clone();
    let store_ok = tokio::task::spawn_blocking(move || store.count_controls(None, None).is_ok())
        .await
        .unwrap_or(false);

    let status = if store_ok { "healthy" } else { "degraded" };
    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "compliancevault",
            "version": env!("CARGO_PKG_VERSION"),
            "database": store_ok
        })),
    )
}
