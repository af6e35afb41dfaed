//! In-memory [`RecordSource`] over plain record lists.
//!
//! Groups and sums with the same null semantics as SQL `SUM`: a group whose
//! values are all null sums to null, otherwise nulls are skipped. Used by
//! tests and by the CLI when reporting from a JSON fixture.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use estate_core::DateRange;

use crate::source::{
    Grain, RawDispatchRow, RawProcessingRow, RawSalesRow, RecordSource, SourceError,
    UnconfirmedDispatch, UnconfirmedSummary,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRecord {
    pub process_date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coffee_type: Option<String>,
    #[serde(default)]
    pub float_kgs: Option<f64>,
    #[serde(default)]
    pub green_kgs: Option<f64>,
    #[serde(default)]
    pub ripe_kgs: Option<f64>,
    #[serde(default)]
    pub dry_parchment_kgs: Option<f64>,
    #[serde(default)]
    pub dry_cherry_kgs: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecord {
    pub dispatch_date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coffee_type: Option<String>,
    #[serde(default)]
    pub bag_type: Option<String>,
    #[serde(default)]
    pub bags_dispatched: Option<f64>,
    /// `None` until the receiving side confirms the weight.
    #[serde(default)]
    pub kgs_received: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub sale_date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coffee_type: Option<String>,
    #[serde(default)]
    pub bag_type: Option<String>,
    #[serde(default)]
    pub bags_sold: Option<f64>,
    #[serde(default)]
    pub kgs_sold: Option<f64>,
    #[serde(default)]
    pub revenue: Option<f64>,
}

/// One tenant's records, as loaded from a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet {
    #[serde(default)]
    pub processing: Vec<ProcessingRecord>,
    #[serde(default)]
    pub dispatches: Vec<DispatchRecord>,
    #[serde(default)]
    pub sales: Vec<SalesRecord>,
}

/// Whether queries answer from `records` or return a canned error.
#[derive(Debug, Clone)]
enum Mode {
    Ok,
    Fail(SourceError),
}

#[derive(Debug, Clone)]
pub struct MemorySource {
    records: RecordSet,
    mode: Mode,
}

impl MemorySource {
    pub fn new(records: RecordSet) -> Self {
        Self {
            records,
            mode: Mode::Ok,
        }
    }

    /// A tenant whose record tables have not been created.
    pub fn without_tables() -> Self {
        Self {
            records: RecordSet::default(),
            mode: Mode::Fail(SourceError::SchemaMissing("processing_records".to_string())),
        }
    }

    /// Every query fails with a read error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            records: RecordSet::default(),
            mode: Mode::Fail(SourceError::Read(message.into())),
        }
    }

    fn check(&self) -> Result<(), SourceError> {
        match &self.mode {
            Mode::Ok => Ok(()),
            Mode::Fail(e) => Err(e.clone()),
        }
    }
}

fn add_opt(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (None, None) => None,
        (a, v) => Some(a.unwrap_or(0.0) + v.unwrap_or(0.0)),
    }
}

fn day_for(grain: Grain, date: NaiveDate) -> Option<NaiveDate> {
    match grain {
        Grain::Total => None,
        Grain::Daily => Some(date),
    }
}

type GroupKey = (Option<NaiveDate>, Option<String>, Option<String>, Option<String>);

#[async_trait]
impl RecordSource for MemorySource {
    async fn processing(
        &self,
        range: DateRange,
        grain: Grain,
    ) -> Result<Vec<RawProcessingRow>, SourceError> {
        self.check()?;
        let mut groups: BTreeMap<GroupKey, RawProcessingRow> = BTreeMap::new();
        for r in self.records.processing.iter().filter(|r| range.contains(r.process_date)) {
            let day = day_for(grain, r.process_date);
            let row = groups
                .entry((day, r.location.clone(), r.coffee_type.clone(), None))
                .or_insert_with(|| RawProcessingRow {
                    day,
                    location: r.location.clone(),
                    coffee_type: r.coffee_type.clone(),
                    ..Default::default()
                });
            row.float_kgs = add_opt(row.float_kgs, r.float_kgs);
            row.green_kgs = add_opt(row.green_kgs, r.green_kgs);
            row.ripe_kgs = add_opt(row.ripe_kgs, r.ripe_kgs);
            row.dry_parchment_kgs = add_opt(row.dry_parchment_kgs, r.dry_parchment_kgs);
            row.dry_cherry_kgs = add_opt(row.dry_cherry_kgs, r.dry_cherry_kgs);
        }
        Ok(groups.into_values().collect())
    }

    async fn dispatches(
        &self,
        range: DateRange,
        grain: Grain,
    ) -> Result<Vec<RawDispatchRow>, SourceError> {
        self.check()?;
        let mut groups: BTreeMap<GroupKey, RawDispatchRow> = BTreeMap::new();
        for r in self.records.dispatches.iter().filter(|r| range.contains(r.dispatch_date)) {
            let day = day_for(grain, r.dispatch_date);
            let row = groups
                .entry((day, r.location.clone(), r.coffee_type.clone(), r.bag_type.clone()))
                .or_insert_with(|| RawDispatchRow {
                    day,
                    location: r.location.clone(),
                    coffee_type: r.coffee_type.clone(),
                    bag_type: r.bag_type.clone(),
                    ..Default::default()
                });
            row.dispatched_bags = add_opt(row.dispatched_bags, r.bags_dispatched);
            if r.kgs_received.is_some() {
                row.confirmed_bags = add_opt(row.confirmed_bags, r.bags_dispatched);
                row.received_kgs = add_opt(row.received_kgs, r.kgs_received);
            }
        }
        Ok(groups.into_values().collect())
    }

    async fn sales(&self, range: DateRange, grain: Grain) -> Result<Vec<RawSalesRow>, SourceError> {
        self.check()?;
        let mut groups: BTreeMap<GroupKey, RawSalesRow> = BTreeMap::new();
        for r in self.records.sales.iter().filter(|r| range.contains(r.sale_date)) {
            let day = day_for(grain, r.sale_date);
            let row = groups
                .entry((day, r.location.clone(), r.coffee_type.clone(), r.bag_type.clone()))
                .or_insert_with(|| RawSalesRow {
                    day,
                    location: r.location.clone(),
                    coffee_type: r.coffee_type.clone(),
                    bag_type: r.bag_type.clone(),
                    ..Default::default()
                });
            row.sold_bags = add_opt(row.sold_bags, r.bags_sold);
            row.sold_kgs = add_opt(row.sold_kgs, r.kgs_sold);
            row.revenue = add_opt(row.revenue, r.revenue);
        }
        Ok(groups.into_values().collect())
    }

    async fn unconfirmed_dispatches(
        &self,
        dispatched_before: NaiveDate,
        sample: usize,
    ) -> Result<UnconfirmedSummary, SourceError> {
        self.check()?;
        let mut pending: Vec<&DispatchRecord> = self
            .records
            .dispatches
            .iter()
            .filter(|r| r.kgs_received.is_none() && r.dispatch_date < dispatched_before)
            .collect();
        pending.sort_by(|a, b| pending_order(a).cmp(&pending_order(b)));

        Ok(UnconfirmedSummary {
            count: pending.len() as u64,
            oldest: pending
                .into_iter()
                .take(sample)
                .map(|r| UnconfirmedDispatch {
                    dispatch_date: r.dispatch_date,
                    location: r.location.clone().unwrap_or_default(),
                    coffee_type: r.coffee_type.clone().unwrap_or_default(),
                    bags: r.bags_dispatched.unwrap_or(0.0),
                })
                .collect(),
        })
    }
}

/// Oldest first; same-day ties by location then coffee type (nulls as "").
fn pending_order(r: &DispatchRecord) -> (NaiveDate, &str, &str) {
    (
        r.dispatch_date,
        r.location.as_deref().unwrap_or(""),
        r.coffee_type.as_deref().unwrap_or(""),
    )
}
