//! Typed projection of raw store rows into [`MetricWindow`]s.
//!
//! This is the only place that treats missing or non-numeric values as 0
//! and the only place that turns loose label columns into composite keys.

use chrono::NaiveDate;
use tracing::warn;

use estate_core::{DateRange, LocationCoffee, LocationCoffeeBag};

use crate::math::coerce;
use crate::metrics::{DispatchTotals, MetricWindow, ProcessingTotals, SalesTotals};
use crate::source::{RawDispatchRow, RawProcessingRow, RawSalesRow};

/// Label used when a row has no location.
pub const UNASSIGNED_LOCATION: &str = "Unassigned";

/// Label used when a row has no coffee type or bag type.
pub const UNSPECIFIED: &str = "Unspecified";

fn label(value: &Option<String>, fallback: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

fn location_coffee(location: &Option<String>, coffee_type: &Option<String>) -> LocationCoffee {
    LocationCoffee::new(
        label(location, UNASSIGNED_LOCATION),
        label(coffee_type, UNSPECIFIED),
    )
}

fn processing_totals(row: &RawProcessingRow) -> ProcessingTotals {
    ProcessingTotals {
        float_kgs: coerce(row.float_kgs),
        green_kgs: coerce(row.green_kgs),
        ripe_kgs: coerce(row.ripe_kgs),
        dry_parchment_kgs: coerce(row.dry_parchment_kgs),
        dry_cherry_kgs: coerce(row.dry_cherry_kgs),
    }
}

fn dispatch_totals(row: &RawDispatchRow) -> DispatchTotals {
    DispatchTotals {
        dispatched_bags: coerce(row.dispatched_bags),
        confirmed_bags: coerce(row.confirmed_bags),
        received_kgs: coerce(row.received_kgs),
    }
}

fn sales_totals(row: &RawSalesRow) -> SalesTotals {
    SalesTotals {
        sold_bags: coerce(row.sold_bags),
        sold_kgs: coerce(row.sold_kgs),
        revenue: coerce(row.revenue),
    }
}

/// Resolve the bucket day of a daily-grain row, dropping rows outside `range`.
fn bucket_day(day: Option<NaiveDate>, range: &DateRange, table: &str) -> Option<NaiveDate> {
    match day {
        Some(d) if range.contains(d) => Some(d),
        Some(d) => {
            warn!(table, day = %d, range = %range, "daily row outside requested range, ignoring");
            None
        }
        None => {
            warn!(table, range = %range, "daily row without a day, ignoring");
            None
        }
    }
}

pub fn processing_by_key(
    range: DateRange,
    rows: &[RawProcessingRow],
) -> MetricWindow<LocationCoffee, ProcessingTotals> {
    let mut window = MetricWindow::empty(range);
    for row in rows {
        window.accumulate(location_coffee(&row.location, &row.coffee_type), processing_totals(row));
    }
    window
}

/// Per-day, per-key processing sums (baseline input).
pub fn processing_by_day_and_key(
    range: DateRange,
    rows: &[RawProcessingRow],
) -> MetricWindow<(NaiveDate, LocationCoffee), ProcessingTotals> {
    let mut window = MetricWindow::empty(range);
    for row in rows {
        if let Some(day) = bucket_day(row.day, &range, "processing") {
            window.accumulate(
                (day, location_coffee(&row.location, &row.coffee_type)),
                processing_totals(row),
            );
        }
    }
    window
}

/// Estate-wide processing sums per day.
pub fn processing_by_day(
    range: DateRange,
    rows: &[RawProcessingRow],
) -> MetricWindow<NaiveDate, ProcessingTotals> {
    let mut window = MetricWindow::empty(range);
    for row in rows {
        if let Some(day) = bucket_day(row.day, &range, "processing") {
            window.accumulate(day, processing_totals(row));
        }
    }
    window
}

/// Dispatch sums per (location, coffee type); bag types are folded together.
pub fn dispatch_by_key(
    range: DateRange,
    rows: &[RawDispatchRow],
) -> MetricWindow<LocationCoffee, DispatchTotals> {
    let mut window = MetricWindow::empty(range);
    for row in rows {
        window.accumulate(location_coffee(&row.location, &row.coffee_type), dispatch_totals(row));
    }
    window
}

pub fn dispatch_by_day(
    range: DateRange,
    rows: &[RawDispatchRow],
) -> MetricWindow<NaiveDate, DispatchTotals> {
    let mut window = MetricWindow::empty(range);
    for row in rows {
        if let Some(day) = bucket_day(row.day, &range, "dispatch") {
            window.accumulate(day, dispatch_totals(row));
        }
    }
    window
}

pub fn sales_by_key(
    range: DateRange,
    rows: &[RawSalesRow],
) -> MetricWindow<LocationCoffeeBag, SalesTotals> {
    let mut window = MetricWindow::empty(range);
    for row in rows {
        let key = LocationCoffeeBag::new(
            label(&row.location, UNASSIGNED_LOCATION),
            label(&row.coffee_type, UNSPECIFIED),
            label(&row.bag_type, UNSPECIFIED),
        );
        window.accumulate(key, sales_totals(row));
    }
    window
}

pub fn sales_by_day(range: DateRange, rows: &[RawSalesRow]) -> MetricWindow<NaiveDate, SalesTotals> {
    let mut window = MetricWindow::empty(range);
    for row in rows {
        if let Some(day) = bucket_day(row.day, &range, "sales") {
            window.accumulate(day, sales_totals(row));
        }
    }
    window
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn nulls_contribute_zero_and_rows_are_kept() {
        let range = DateRange::new(d(1), d(7));
        let rows = vec![
            RawProcessingRow {
                location: Some("North".into()),
                coffee_type: Some("Arabica".into()),
                float_kgs: None,
                green_kgs: Some(400.0),
                ..Default::default()
            },
            RawProcessingRow {
                location: Some("North".into()),
                coffee_type: Some("Arabica".into()),
                float_kgs: Some(f64::NAN),
                green_kgs: Some(0.0),
                ripe_kgs: Some(10.0),
                ..Default::default()
            },
        ];
        let w = processing_by_key(range, &rows);
        let totals = w.get(&LocationCoffee::new("North", "Arabica"));
        assert_eq!(totals.float_kgs, 0.0);
        assert_eq!(totals.green_kgs, 400.0);
        assert_eq!(totals.ripe_kgs, 10.0);
    }

    #[test]
    fn missing_labels_get_placeholders() {
        let range = DateRange::new(d(1), d(7));
        let rows = vec![RawSalesRow {
            location: Some("  ".into()),
            sold_kgs: Some(5.0),
            ..Default::default()
        }];
        let w = sales_by_key(range, &rows);
        let key = LocationCoffeeBag::new(UNASSIGNED_LOCATION, UNSPECIFIED, UNSPECIFIED);
        assert_eq!(w.get(&key).sold_kgs, 5.0);
    }

    #[test]
    fn dispatch_folds_bag_types() {
        let range = DateRange::new(d(1), d(7));
        let row = |bag: &str, bags: f64| RawDispatchRow {
            location: Some("South".into()),
            coffee_type: Some("Robusta".into()),
            bag_type: Some(bag.into()),
            dispatched_bags: Some(bags),
            ..Default::default()
        };
        let w = dispatch_by_key(range, &[row("Parchment", 3.0), row("Cherry", 2.0)]);
        assert_eq!(w.groups.len(), 1);
        assert_eq!(w.get(&LocationCoffee::new("South", "Robusta")).dispatched_bags, 5.0);
    }

    #[test]
    fn daily_rows_bucket_by_day() {
        let range = DateRange::new(d(1), d(3));
        let rows = vec![
            RawSalesRow { day: Some(d(1)), revenue: Some(10.0), ..Default::default() },
            RawSalesRow { day: Some(d(1)), revenue: Some(5.0), ..Default::default() },
            RawSalesRow { day: Some(d(3)), revenue: Some(1.0), ..Default::default() },
            RawSalesRow { day: Some(d(9)), revenue: Some(99.0), ..Default::default() },
            RawSalesRow { day: None, revenue: Some(99.0), ..Default::default() },
        ];
        let w = sales_by_day(range, &rows);
        assert_eq!(w.get(&d(1)).revenue, 15.0);
        assert_eq!(w.get(&d(2)).revenue, 0.0);
        assert_eq!(w.get(&d(3)).revenue, 1.0);
        assert_eq!(w.total().revenue, 16.0);
    }
}
