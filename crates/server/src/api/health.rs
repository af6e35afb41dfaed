//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub profile: String,
    /// False when no Postgres credentials were supplied and local defaults are in use.
    pub record_store_configured: bool,
    /// Redacted configuration summary (no secrets).
    #[schema(value_type = Object)]
    pub config: serde_json::Value,
}

/// Server liveness and a redacted config summary.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        profile: state.config.profile_label().to_string(),
        record_store_configured: state.config.postgres.is_configured(),
        config: state.config.redacted_summary(),
    })
}
