//! Read-only seam to the external record store.
//!
//! The engine never owns raw rows; it asks a [`RecordSource`] for grouped
//! sums over a date range. Implementations live outside this crate (the
//! server's Postgres store, in-memory fakes in tests).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use estate_core::{DateRange, EstateError};

/// Errors a record source can report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// The tenant's record tables have not been provisioned yet.
    #[error("record table missing: {0}")]
    SchemaMissing(String),

    /// Anything else: connectivity, query failure, decode failure.
    #[error("record read failed: {0}")]
    Read(String),
}

impl From<SourceError> for EstateError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::SchemaMissing(t) => EstateError::SchemaMissing(t),
            SourceError::Read(m) => EstateError::Read(m),
        }
    }
}

/// Row granularity requested from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grain {
    /// One row per grouping key over the whole range; `day` is `None`.
    Total,
    /// One row per grouping key per calendar day.
    Daily,
}

/// Grouped processing sums as returned by the store, before coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProcessingRow {
    pub day: Option<NaiveDate>,
    pub location: Option<String>,
    pub coffee_type: Option<String>,
    pub float_kgs: Option<f64>,
    pub green_kgs: Option<f64>,
    pub ripe_kgs: Option<f64>,
    pub dry_parchment_kgs: Option<f64>,
    pub dry_cherry_kgs: Option<f64>,
}

/// Grouped dispatch sums as returned by the store, before coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDispatchRow {
    pub day: Option<NaiveDate>,
    pub location: Option<String>,
    pub coffee_type: Option<String>,
    pub bag_type: Option<String>,
    pub dispatched_bags: Option<f64>,
    /// Bags on rows that have a received weight.
    pub confirmed_bags: Option<f64>,
    pub received_kgs: Option<f64>,
}

/// Grouped sales sums as returned by the store, before coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSalesRow {
    pub day: Option<NaiveDate>,
    pub location: Option<String>,
    pub coffee_type: Option<String>,
    pub bag_type: Option<String>,
    pub sold_bags: Option<f64>,
    pub sold_kgs: Option<f64>,
    pub revenue: Option<f64>,
}

/// One dispatch with no received weight recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnconfirmedDispatch {
    pub dispatch_date: NaiveDate,
    pub location: String,
    pub coffee_type: String,
    pub bags: f64,
}

/// Count of overdue unconfirmed dispatches plus the oldest few.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnconfirmedSummary {
    pub count: u64,
    /// Oldest first, at most the requested sample size.
    pub oldest: Vec<UnconfirmedDispatch>,
}

/// Grouped, read-only access to one tenant's processing, dispatch and sales records.
///
/// Total-grain rows are grouped by (location, coffee type) for processing and
/// by (location, coffee type, bag type) for dispatch and sales. Daily-grain rows
/// add the calendar day to the group.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn processing(
        &self,
        range: DateRange,
        grain: Grain,
    ) -> Result<Vec<RawProcessingRow>, SourceError>;

    async fn dispatches(
        &self,
        range: DateRange,
        grain: Grain,
    ) -> Result<Vec<RawDispatchRow>, SourceError>;

    async fn sales(&self, range: DateRange, grain: Grain) -> Result<Vec<RawSalesRow>, SourceError>;

    /// Dispatches dated before `dispatched_before` with no received weight.
    async fn unconfirmed_dispatches(
        &self,
        dispatched_before: NaiveDate,
        sample: usize,
    ) -> Result<UnconfirmedSummary, SourceError>;
}
