//! Liveness probe.

use axum::response::Json;

/// `GET /v1/healthz` — public, used by load balancers and `doctor`.
pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mentora",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
