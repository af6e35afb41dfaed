//! Benchmark & Sparkline Builder.
//!
//! Runs on the same [`AggregateBatch`] as the detectors but never reads their
//! output. Produces:
//! - four-period [`Benchmark`]s (this week, last week, month to date,
//!   same month last year) plus the tenant targets;
//! - [`Sparklines`]: the most recent points of the 14-day daily series;
//! - [`LocationComparison`]s: per-location deltas against the current
//!   estate average, worst yield first.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use estate_core::{LocationCoffee, LocationCoffeeBag};

use crate::aggregator::AggregateBatch;
use crate::metrics::{DispatchTotals, MetricWindow, ProcessingTotals, SalesTotals};
use crate::thresholds::{Limits, Targets};

/// One period's headline figures. Ratios are fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
    pub yield_ratio: f64,
    pub float_rate: f64,
    pub loss_pct: f64,
    pub avg_price_per_kg: f64,
    pub revenue: f64,
    pub processed_kgs: f64,
    pub sold_kgs: f64,
}

impl Benchmark {
    pub fn from_totals(
        processing: &ProcessingTotals,
        dispatch: &DispatchTotals,
        sales: &SalesTotals,
        bag_weight_kgs: f64,
    ) -> Self {
        Self {
            yield_ratio: processing.yield_ratio(),
            float_rate: processing.float_rate(),
            loss_pct: dispatch.loss_pct(bag_weight_kgs),
            avg_price_per_kg: sales.avg_price_per_kg(),
            revenue: sales.revenue,
            processed_kgs: processing.processed_kgs(),
            sold_kgs: sales.sold_kgs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSet {
    pub this_week: Benchmark,
    pub last_week: Benchmark,
    pub month_to_date: Benchmark,
    pub same_month_last_year: Benchmark,
    pub targets: Targets,
}

/// Daily series for dashboard charts, oldest point first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sparklines {
    pub yield_ratio: Vec<f64>,
    pub loss_pct: Vec<f64>,
    pub avg_price_per_kg: Vec<f64>,
    pub revenue: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationComparison {
    pub location: String,
    pub yield_ratio: f64,
    pub float_rate: f64,
    /// Location yield minus estate yield, current window.
    pub yield_delta: f64,
    pub float_delta: f64,
}

pub fn build_benchmarks(batch: &AggregateBatch, bag_weight_kgs: f64, targets: &Targets) -> BenchmarkSet {
    let p = &batch.processing;
    let d = &batch.dispatch;
    let s = &batch.sales;
    BenchmarkSet {
        this_week: period(&p.current, &d.current, &s.current, bag_weight_kgs),
        last_week: period(&p.prior, &d.prior, &s.prior, bag_weight_kgs),
        month_to_date: period(&p.month_to_date, &d.month_to_date, &s.month_to_date, bag_weight_kgs),
        same_month_last_year: period(
            &p.same_month_last_year,
            &d.same_month_last_year,
            &s.same_month_last_year,
            bag_weight_kgs,
        ),
        targets: targets.clone(),
    }
}

fn period(
    processing: &MetricWindow<LocationCoffee, ProcessingTotals>,
    dispatch: &MetricWindow<LocationCoffee, DispatchTotals>,
    sales: &MetricWindow<LocationCoffeeBag, SalesTotals>,
    bag_weight_kgs: f64,
) -> Benchmark {
    Benchmark::from_totals(&processing.total(), &dispatch.total(), &sales.total(), bag_weight_kgs)
}

/// Zero-fill every day of the daily window, then keep the last `limits.sparkline_points()`.
pub fn build_sparklines(batch: &AggregateBatch, bag_weight_kgs: f64, limits: &Limits) -> Sparklines {
    let range = batch.daily_processing.range;
    let days: Vec<_> = range.days().collect();
    let keep = limits.sparkline_points().min(days.len());
    let recent = &days[days.len() - keep..];

    let mut lines = Sparklines {
        yield_ratio: Vec::with_capacity(keep),
        loss_pct: Vec::with_capacity(keep),
        avg_price_per_kg: Vec::with_capacity(keep),
        revenue: Vec::with_capacity(keep),
    };
    for day in recent {
        let processing = batch.daily_processing.get(day);
        let dispatch = batch.daily_dispatch.get(day);
        let sales = batch.daily_sales.get(day);
        lines.yield_ratio.push(processing.yield_ratio());
        lines.loss_pct.push(dispatch.loss_pct(bag_weight_kgs));
        lines.avg_price_per_kg.push(sales.avg_price_per_kg());
        lines.revenue.push(sales.revenue);
    }
    lines
}

/// Per-location yield and float deltas against the current estate average.
///
/// Sorted ascending by yield delta (worst first); ties keep location order.
pub fn compare_locations(batch: &AggregateBatch, limits: &Limits) -> Vec<LocationComparison> {
    let current = &batch.processing.current;
    let estate = current.total();
    let estate_yield = estate.yield_ratio();
    let estate_float = estate.float_rate();

    let mut by_location: BTreeMap<&str, ProcessingTotals> = BTreeMap::new();
    for (key, totals) in &current.groups {
        *by_location.entry(key.location.as_str()).or_default() += *totals;
    }

    let mut rows: Vec<LocationComparison> = by_location
        .into_iter()
        .map(|(location, totals)| {
            let yield_ratio = totals.yield_ratio();
            let float_rate = totals.float_rate();
            LocationComparison {
                location: location.to_string(),
                yield_ratio,
                float_rate,
                yield_delta: yield_ratio - estate_yield,
                float_delta: float_rate - estate_float,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.yield_delta.partial_cmp(&b.yield_delta).unwrap_or(Ordering::Equal));
    rows.truncate(limits.location_comparisons());
    rows
}
