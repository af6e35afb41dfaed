//! Window Aggregator: one fork-join batch of read queries per report.
//!
//! All queries are independent read-only projections, so they are issued
//! concurrently and joined before any computation starts. The first failure
//! aborts the whole batch; nothing is retried or partially served.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::debug;

use estate_core::{LocationCoffee, LocationCoffeeBag};

use crate::metrics::{DispatchTotals, MetricWindow, ProcessingTotals, SalesTotals};
use crate::projection;
use crate::source::{Grain, RecordSource, SourceError, UnconfirmedSummary};
use crate::windows::ReportWindows;

/// The same metric evaluated over the four benchmark periods.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSet<T> {
    pub current: T,
    pub prior: T,
    pub month_to_date: T,
    pub same_month_last_year: T,
}

/// Every aggregate a report needs, already projected into typed windows.
#[derive(Debug, Clone)]
pub struct AggregateBatch {
    pub windows: ReportWindows,
    pub processing: PeriodSet<MetricWindow<LocationCoffee, ProcessingTotals>>,
    pub dispatch: PeriodSet<MetricWindow<LocationCoffee, DispatchTotals>>,
    pub sales: PeriodSet<MetricWindow<LocationCoffeeBag, SalesTotals>>,
    /// Per-day, per-key processing over the baseline range.
    pub baseline: MetricWindow<(NaiveDate, LocationCoffee), ProcessingTotals>,
    pub daily_processing: MetricWindow<NaiveDate, ProcessingTotals>,
    pub daily_dispatch: MetricWindow<NaiveDate, DispatchTotals>,
    pub daily_sales: MetricWindow<NaiveDate, SalesTotals>,
    pub unconfirmed: UnconfirmedSummary,
}

/// Issue every window query concurrently and project the results.
pub async fn collect(
    source: &dyn RecordSource,
    windows: &ReportWindows,
    unconfirmed_days: u32,
    dispatch_samples: usize,
) -> Result<AggregateBatch, SourceError> {
    let start = Instant::now();
    let w = windows;

    let (
        p_current,
        p_prior,
        p_mtd,
        p_last_year,
        p_baseline,
        p_daily,
        d_current,
        d_prior,
        d_mtd,
        d_last_year,
        d_daily,
        s_current,
        s_prior,
        s_mtd,
        s_last_year,
        s_daily,
        unconfirmed,
    ) = tokio::try_join!(
        source.processing(w.current, Grain::Total),
        source.processing(w.prior, Grain::Total),
        source.processing(w.month_to_date, Grain::Total),
        source.processing(w.same_month_last_year, Grain::Total),
        source.processing(w.baseline, Grain::Daily),
        source.processing(w.daily, Grain::Daily),
        source.dispatches(w.current, Grain::Total),
        source.dispatches(w.prior, Grain::Total),
        source.dispatches(w.month_to_date, Grain::Total),
        source.dispatches(w.same_month_last_year, Grain::Total),
        source.dispatches(w.daily, Grain::Daily),
        source.sales(w.current, Grain::Total),
        source.sales(w.prior, Grain::Total),
        source.sales(w.month_to_date, Grain::Total),
        source.sales(w.same_month_last_year, Grain::Total),
        source.sales(w.daily, Grain::Daily),
        source.unconfirmed_dispatches(w.unconfirmed_cutoff(unconfirmed_days), dispatch_samples),
    )?;

    debug!(
        processing_rows = p_current.len() + p_prior.len() + p_baseline.len(),
        dispatch_rows = d_current.len() + d_prior.len(),
        sales_rows = s_current.len() + s_prior.len(),
        unconfirmed = unconfirmed.count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "window batch fetched"
    );

    Ok(AggregateBatch {
        windows: *w,
        processing: PeriodSet {
            current: projection::processing_by_key(w.current, &p_current),
            prior: projection::processing_by_key(w.prior, &p_prior),
            month_to_date: projection::processing_by_key(w.month_to_date, &p_mtd),
            same_month_last_year: projection::processing_by_key(w.same_month_last_year, &p_last_year),
        },
        dispatch: PeriodSet {
            current: projection::dispatch_by_key(w.current, &d_current),
            prior: projection::dispatch_by_key(w.prior, &d_prior),
            month_to_date: projection::dispatch_by_key(w.month_to_date, &d_mtd),
            same_month_last_year: projection::dispatch_by_key(w.same_month_last_year, &d_last_year),
        },
        sales: PeriodSet {
            current: projection::sales_by_key(w.current, &s_current),
            prior: projection::sales_by_key(w.prior, &s_prior),
            month_to_date: projection::sales_by_key(w.month_to_date, &s_mtd),
            same_month_last_year: projection::sales_by_key(w.same_month_last_year, &s_last_year),
        },
        baseline: projection::processing_by_day_and_key(w.baseline, &p_baseline),
        daily_processing: projection::processing_by_day(w.daily, &p_daily),
        daily_dispatch: projection::dispatch_by_day(w.daily, &d_daily),
        daily_sales: projection::sales_by_day(w.daily, &s_daily),
        unconfirmed,
    })
}
