//! HTTP endpoint modules.
//!
//! Shared error response and status mapping live here in mod.rs.

pub mod doc;
pub mod exceptions;
pub mod health;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use estate_core::EstateError;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a domain error to its HTTP status and JSON body.
pub fn api_error(e: EstateError) -> ApiError {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("request failed: {}", e);
    }
    (status, Json(ErrorResponse { error: e.to_string() }))
}

// ── Re-exports ───────────────────────────────────────────────────

pub use exceptions::get_exceptions;
pub use health::health;
