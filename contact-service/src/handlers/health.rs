use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Liveness probe. Independent of delivery settings so it never flaps when
/// credentials are missing; reports the resolved recipient for diagnostics.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "target_email": state.config.recipient,
        "service": "contact-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
