use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.config.service_name,
    }))
}

/// Prometheus scrape endpoint.
pub async fn metrics() -> String {
    service_core::observability::get_metrics()
}
