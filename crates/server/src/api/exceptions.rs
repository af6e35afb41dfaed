//! Exceptions endpoint: alerts, benchmarks and sparklines for one tenant.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use estate_compute::ExceptionsReport;

use super::{api_error, ApiError, ErrorResponse};
use crate::service::exceptions_for_tenant;
use crate::state::AppState;
use crate::tenant::TenantContext;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionsQuery {
    /// Reference date (YYYY-MM-DD). Defaults to today (UTC).
    pub as_of: Option<NaiveDate>,
}

/// Compute the exceptions report for the calling tenant.
///
/// A tenant whose record tables do not exist yet gets a 200 with zeroed
/// benchmarks and no alerts.
#[utoipa::path(
    get,
    path = "/api/exceptions",
    tag = "Exceptions",
    params(
        ("x-tenant-id" = String, Header, description = "Tenant UUID"),
        ("x-enabled-modules" = String, Header, description = "Comma-separated enabled modules"),
        ExceptionsQuery,
    ),
    responses(
        (status = 200, description = "Exceptions report", body = ExceptionsReport),
        (status = 401, description = "Missing or invalid tenant header", body = ErrorResponse),
        (status = 403, description = "Exceptions module not enabled", body = ErrorResponse),
        (status = 404, description = "Unknown tenant", body = ErrorResponse),
        (status = 500, description = "Record store read failed", body = ErrorResponse)
    )
)]
pub async fn get_exceptions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ExceptionsQuery>,
) -> Result<Json<ExceptionsReport>, ApiError> {
    let ctx = TenantContext::from_headers(&headers).map_err(api_error)?;
    ctx.require_module(&state.config.engine.module).map_err(api_error)?;

    let today = params.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let report = exceptions_for_tenant(state.store.as_ref(), &state.config.engine, ctx.tenant_id, today)
        .await
        .map_err(api_error)?;

    Ok(Json(report))
}
