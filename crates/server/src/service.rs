//! Resolves a tenant's settings into an engine request and runs it.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use estate_compute::{ExceptionEngine, ExceptionRequest, ExceptionsReport, ThresholdConfig};
use estate_core::config::EngineConfig;
use estate_core::EstateError;

use crate::store::{EstateStore, TenantSettings};

/// Build the engine request from persisted settings.
///
/// A missing or non-positive bag weight falls back to the configured default.
pub fn request_for(settings: &TenantSettings, engine: &EngineConfig, today: NaiveDate) -> ExceptionRequest {
    let bag_weight_kgs = settings
        .bag_weight_kgs
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(engine.default_bag_weight_kgs);

    ExceptionRequest {
        today,
        bag_weight_kgs,
        thresholds: ThresholdConfig::resolve(settings.exception_thresholds.as_ref()),
    }
}

pub async fn exceptions_for_tenant(
    store: &dyn EstateStore,
    engine: &EngineConfig,
    tenant_id: Uuid,
    today: NaiveDate,
) -> Result<ExceptionsReport, EstateError> {
    let start = Instant::now();
    let settings = store
        .tenant_settings(tenant_id)
        .await?
        .ok_or_else(|| EstateError::TenantNotFound(tenant_id.to_string()))?;

    let request = request_for(&settings, engine, today);
    let source = store.record_source(&settings)?;
    let report = ExceptionEngine::run(source.as_ref(), &request).await?;

    info!(
        tenant = %tenant_id,
        schema = %settings.schema_name,
        alerts = report.alerts.len(),
        "exceptions report served in {}ms",
        start.elapsed().as_millis()
    );
    Ok(report)
}
