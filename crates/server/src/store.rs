//! PostgreSQL access: tenant settings and per-tenant record tables.
//!
//! [`PgEstateStore`] reads the tenant row; [`PgRecordSource`] runs the grouped
//! window queries against the tenant's own schema. Both are read-only.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use estate_compute::source::{
    RawDispatchRow, RawProcessingRow, RawSalesRow, UnconfirmedDispatch, UnconfirmedSummary,
};
use estate_compute::{Grain, RecordSource, SourceError};
use estate_core::{DateRange, EstateError};

/// Postgres `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

const PROCESSING_TABLE: &str = "processing_records";
const DISPATCH_TABLE: &str = "dispatch_records";
const SALES_TABLE: &str = "sales_records";

// ── Tenant settings ──────────────────────────────────────────────────

/// The persisted per-tenant inputs the engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantSettings {
    pub tenant_id: Uuid,
    /// Schema holding this tenant's record tables.
    pub schema_name: String,
    pub bag_weight_kgs: Option<f64>,
    /// Raw override blob: JSON object, JSON string, or absent.
    pub exception_thresholds: Option<serde_json::Value>,
}

/// Everything the HTTP layer needs from storage.
#[async_trait]
pub trait EstateStore: Send + Sync {
    async fn tenant_settings(&self, tenant_id: Uuid) -> Result<Option<TenantSettings>, EstateError>;

    /// Record source scoped to one tenant's schema.
    fn record_source(&self, settings: &TenantSettings) -> Result<Arc<dyn RecordSource>, EstateError>;
}

/// Postgres-backed [`EstateStore`].
pub struct PgEstateStore {
    pool: PgPool,
    tenant_table: String,
}

impl PgEstateStore {
    pub fn new(pool: PgPool, tenant_table: impl Into<String>) -> Result<Self, EstateError> {
        let tenant_table = tenant_table.into();
        if !is_qualified_identifier(&tenant_table) {
            return Err(EstateError::Config(format!("invalid tenant table name '{tenant_table}'")));
        }
        Ok(Self { pool, tenant_table })
    }
}

#[async_trait]
impl EstateStore for PgEstateStore {
    async fn tenant_settings(&self, tenant_id: Uuid) -> Result<Option<TenantSettings>, EstateError> {
        let sql = format!(
            "SELECT schema_name, bag_weight_kgs::float8, exception_thresholds::text
             FROM {} WHERE id = $1",
            self.tenant_table
        );
        let row = sqlx::query_as::<_, (String, Option<f64>, Option<String>)>(&sql)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(tenant = %tenant_id, "tenant settings query failed: {}", e);
                EstateError::Read(e.to_string())
            })?;

        Ok(row.map(|(schema_name, bag_weight_kgs, raw)| TenantSettings {
            tenant_id,
            schema_name,
            bag_weight_kgs,
            exception_thresholds: raw.map(parse_threshold_column),
        }))
    }

    fn record_source(&self, settings: &TenantSettings) -> Result<Arc<dyn RecordSource>, EstateError> {
        let source = PgRecordSource::new(self.pool.clone(), &settings.schema_name)?;
        Ok(Arc::new(source))
    }
}

/// Text of a json/jsonb/text column. Unparseable text is passed through as a
/// JSON string so the threshold resolver can log it and fall back.
fn parse_threshold_column(raw: String) -> serde_json::Value {
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}

// ── Record source ────────────────────────────────────────────────────

/// Grouped window queries against one tenant schema.
pub struct PgRecordSource {
    pool: PgPool,
    schema: String,
}

impl PgRecordSource {
    pub fn new(pool: PgPool, schema: &str) -> Result<Self, EstateError> {
        if !is_identifier(schema) {
            return Err(EstateError::Config(format!("invalid tenant schema name '{schema}'")));
        }
        Ok(Self {
            pool,
            schema: schema.to_string(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("\"{}\".{}", self.schema, name)
    }
}

/// `(day column, GROUP BY prefix)` for a grain.
fn grain_columns(grain: Grain, date_column: &str) -> (String, String) {
    match grain {
        Grain::Total => ("NULL::date".to_string(), String::new()),
        Grain::Daily => (date_column.to_string(), format!("{date_column}, ")),
    }
}

fn map_read_error(e: sqlx::Error, table: &str) -> SourceError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(UNDEFINED_TABLE) {
            return SourceError::SchemaMissing(table.to_string());
        }
    }
    error!(table, "record query failed: {}", e);
    SourceError::Read(e.to_string())
}

type ProcessingTuple = (
    Option<NaiveDate>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

type DispatchTuple = (
    Option<NaiveDate>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

type SalesTuple = (
    Option<NaiveDate>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn processing(
        &self,
        range: DateRange,
        grain: Grain,
    ) -> Result<Vec<RawProcessingRow>, SourceError> {
        let (day, group) = grain_columns(grain, "process_date");
        let sql = format!(
            "SELECT {day}, location, coffee_type,
                    SUM(float_kgs)::float8, SUM(green_kgs)::float8, SUM(ripe_kgs)::float8,
                    SUM(dry_parchment_kgs)::float8, SUM(dry_cherry_kgs)::float8
             FROM {table}
             WHERE process_date BETWEEN $1 AND $2
             GROUP BY {group}location, coffee_type",
            table = self.table(PROCESSING_TABLE),
        );
        let rows = sqlx::query_as::<_, ProcessingTuple>(&sql)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_read_error(e, PROCESSING_TABLE))?;
        debug!(range = %range, rows = rows.len(), "processing window");

        Ok(rows
            .into_iter()
            .map(|(day, location, coffee_type, float, green, ripe, parchment, cherry)| RawProcessingRow {
                day,
                location,
                coffee_type,
                float_kgs: float,
                green_kgs: green,
                ripe_kgs: ripe,
                dry_parchment_kgs: parchment,
                dry_cherry_kgs: cherry,
            })
            .collect())
    }

    async fn dispatches(
        &self,
        range: DateRange,
        grain: Grain,
    ) -> Result<Vec<RawDispatchRow>, SourceError> {
        let (day, group) = grain_columns(grain, "dispatch_date");
        let sql = format!(
            "SELECT {day}, location, coffee_type, bag_type,
                    SUM(bags_dispatched)::float8,
                    (SUM(bags_dispatched) FILTER (WHERE kgs_received IS NOT NULL))::float8,
                    SUM(kgs_received)::float8
             FROM {table}
             WHERE dispatch_date BETWEEN $1 AND $2
             GROUP BY {group}location, coffee_type, bag_type",
            table = self.table(DISPATCH_TABLE),
        );
        let rows = sqlx::query_as::<_, DispatchTuple>(&sql)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_read_error(e, DISPATCH_TABLE))?;
        debug!(range = %range, rows = rows.len(), "dispatch window");

        Ok(rows
            .into_iter()
            .map(|(day, location, coffee_type, bag_type, bags, confirmed, received)| RawDispatchRow {
                day,
                location,
                coffee_type,
                bag_type,
                dispatched_bags: bags,
                confirmed_bags: confirmed,
                received_kgs: received,
            })
            .collect())
    }

    async fn sales(&self, range: DateRange, grain: Grain) -> Result<Vec<RawSalesRow>, SourceError> {
        let (day, group) = grain_columns(grain, "sale_date");
        let sql = format!(
            "SELECT {day}, location, coffee_type, bag_type,
                    SUM(bags_sold)::float8, SUM(kgs_sold)::float8, SUM(revenue)::float8
             FROM {table}
             WHERE sale_date BETWEEN $1 AND $2
             GROUP BY {group}location, coffee_type, bag_type",
            table = self.table(SALES_TABLE),
        );
        let rows = sqlx::query_as::<_, SalesTuple>(&sql)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_read_error(e, SALES_TABLE))?;
        debug!(range = %range, rows = rows.len(), "sales window");

        Ok(rows
            .into_iter()
            .map(|(day, location, coffee_type, bag_type, bags, kgs, revenue)| RawSalesRow {
                day,
                location,
                coffee_type,
                bag_type,
                sold_bags: bags,
                sold_kgs: kgs,
                revenue,
            })
            .collect())
    }

    async fn unconfirmed_dispatches(
        &self,
        dispatched_before: NaiveDate,
        sample: usize,
    ) -> Result<UnconfirmedSummary, SourceError> {
        let table = self.table(DISPATCH_TABLE);

        let count_sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE kgs_received IS NULL AND dispatch_date < $1"
        );
        let count = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(dispatched_before)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_read_error(e, DISPATCH_TABLE))?;

        let sample_sql = unconfirmed_sample_sql(&table);
        let oldest = sqlx::query_as::<_, (NaiveDate, String, String, f64)>(&sample_sql)
            .bind(dispatched_before)
            .bind(i64::try_from(sample).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_read_error(e, DISPATCH_TABLE))?;

        Ok(UnconfirmedSummary {
            count: count.max(0) as u64,
            oldest: oldest
                .into_iter()
                .map(|(dispatch_date, location, coffee_type, bags)| UnconfirmedDispatch {
                    dispatch_date,
                    location,
                    coffee_type,
                    bags,
                })
                .collect(),
        })
    }
}

/// Oldest unconfirmed dispatches; ties on date order by location then coffee type.
fn unconfirmed_sample_sql(table: &str) -> String {
    format!(
        "SELECT dispatch_date, COALESCE(location, ''), COALESCE(coffee_type, ''),
                COALESCE(bags_dispatched, 0)::float8
         FROM {table}
         WHERE kgs_received IS NULL AND dispatch_date < $1
         ORDER BY dispatch_date ASC, COALESCE(location, '') ASC, COALESCE(coffee_type, '') ASC
         LIMIT $2"
    )
}

// ── Identifier validation ────────────────────────────────────────────

/// Lowercase/uppercase ASCII letters, digits and `_`, not starting with a digit.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `table` or `schema.table`.
fn is_qualified_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2 && parts.iter().all(|p| is_identifier(p))
}

// ── Tests ────────────────────────────────────────────────────────────
