//! End-to-end engine runs over an in-memory record source.
//!
//! Reference date for every scenario is 2024-06-20 (a Thursday):
//! current week 06-14..06-20, prior week 06-07..06-13, baseline 04-19..06-13.

use chrono::NaiveDate;
use serde_json::{json, Value};

use estate_compute::memory::{DispatchRecord, ProcessingRecord, SalesRecord};
use estate_compute::{
    Benchmark, ExceptionEngine, ExceptionRequest, ExceptionsReport, MemorySource, RecordSet,
    Severity, SourceError, ThresholdConfig,
};

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, day).unwrap()
}

fn request() -> ExceptionRequest {
    ExceptionRequest {
        today: d(6, 20),
        bag_weight_kgs: 50.0,
        thresholds: ThresholdConfig::default(),
    }
}

fn processing(day: NaiveDate, float: f64, green: f64) -> ProcessingRecord {
    ProcessingRecord {
        process_date: day,
        location: Some("North".into()),
        coffee_type: Some("Arabica".into()),
        float_kgs: Some(float),
        green_kgs: Some(green),
        ..Default::default()
    }
}

fn output(day: NaiveDate, parchment: f64) -> ProcessingRecord {
    ProcessingRecord {
        process_date: day,
        location: Some("North".into()),
        coffee_type: Some("Arabica".into()),
        dry_parchment_kgs: Some(parchment),
        ..Default::default()
    }
}

fn dispatch(day: NaiveDate, bags: f64, received: Option<f64>) -> DispatchRecord {
    DispatchRecord {
        dispatch_date: day,
        location: Some("North".into()),
        coffee_type: Some("Arabica".into()),
        bag_type: Some("Parchment".into()),
        bags_dispatched: Some(bags),
        kgs_received: received,
    }
}

fn sale(day: NaiveDate, kgs: f64, revenue: f64) -> SalesRecord {
    SalesRecord {
        sale_date: day,
        location: Some("North".into()),
        coffee_type: Some("Arabica".into()),
        bag_type: Some("Parchment".into()),
        bags_sold: Some(kgs / 50.0),
        kgs_sold: Some(kgs),
        revenue: Some(revenue),
    }
}

async fn run(records: RecordSet) -> ExceptionsReport {
    ExceptionEngine::run(&MemorySource::new(records), &request())
        .await
        .expect("engine run")
}

fn ids(report: &ExceptionsReport) -> Vec<&str> {
    report.alerts.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn float_rate_increase_week_over_week() {
    let report = run(RecordSet {
        processing: vec![processing(d(6, 15), 100.0, 400.0), processing(d(6, 10), 20.0, 480.0)],
        ..Default::default()
    })
    .await;

    assert_eq!(ids(&report), vec!["float-rate-increase:north:arabica"]);
    let alert = &report.alerts[0];
    assert_eq!(alert.severity, Severity::Medium);
    assert_eq!(alert.location.as_deref(), Some("North"));
    assert_eq!(alert.coffee_type.as_deref(), Some("Arabica"));
    assert!((alert.current.unwrap() - 0.2).abs() < 1e-12);
    assert!((alert.prior.unwrap() - 0.04).abs() < 1e-12);
    assert!((alert.delta_pct.unwrap() - 4.0).abs() < 1e-9);
}

#[tokio::test]
async fn float_rate_anomaly_against_baseline() {
    // Eight baseline Mondays alternating 4% and 6%: mean 5%, population std 1%.
    let mondays = [d(4, 22), d(4, 29), d(5, 6), d(5, 13), d(5, 20), d(5, 27), d(6, 3), d(6, 10)];
    let mut rows: Vec<_> = mondays
        .iter()
        .enumerate()
        .map(|(i, day)| {
            if i % 2 == 0 {
                processing(*day, 20.0, 480.0)
            } else {
                processing(*day, 30.0, 470.0)
            }
        })
        .collect();
    // Current week at 9%.
    rows.push(processing(d(6, 17), 45.0, 455.0));

    let report = run(RecordSet {
        processing: rows,
        ..Default::default()
    })
    .await;

    let anomaly = report
        .alerts
        .iter()
        .find(|a| a.id == "float-rate-anomaly:north:arabica")
        .expect("anomaly alert");
    assert_eq!(anomaly.severity, Severity::High);
    assert!((anomaly.prior.unwrap() - 0.05).abs() < 1e-12);
    // The week-over-week rule sees 6% -> 9% and fires as well, ahead of the anomaly.
    assert_eq!(
        ids(&report),
        vec!["float-rate-increase:north:arabica", "float-rate-anomaly:north:arabica"]
    );
}

#[tokio::test]
async fn transit_loss_spike() {
    let report = run(RecordSet {
        dispatches: vec![dispatch(d(6, 16), 20.0, Some(950.0)), dispatch(d(6, 9), 20.0, Some(990.0))],
        ..Default::default()
    })
    .await;

    let alert = report
        .alerts
        .iter()
        .find(|a| a.id == "transit-loss-spike:north:arabica")
        .expect("transit alert");
    assert_eq!(alert.severity, Severity::High);
    assert!((alert.current.unwrap() - 0.05).abs() < 1e-12);
    assert!((alert.prior.unwrap() - 0.01).abs() < 1e-12);
    assert!((report.benchmarks.this_week.loss_pct - 0.05).abs() < 1e-12);
}

#[tokio::test]
async fn unconfirmed_shipments_are_not_counted_as_lost() {
    let report = run(RecordSet {
        dispatches: vec![
            dispatch(d(6, 16), 20.0, Some(1000.0)),
            dispatch(d(6, 17), 20.0, None),
            dispatch(d(6, 9), 20.0, Some(990.0)),
        ],
        ..Default::default()
    })
    .await;
    assert!(report.alerts.iter().all(|a| a.id != "transit-loss-spike:north:arabica"));
    assert_eq!(report.benchmarks.this_week.loss_pct, 0.0);
}

#[tokio::test]
async fn inventory_mismatch_estate_wide() {
    let report = run(RecordSet {
        processing: vec![output(d(6, 15), 580.0)],
        sales: vec![sale(d(6, 18), 600.0, 2400.0)],
        ..Default::default()
    })
    .await;

    assert_eq!(ids(&report), vec!["inventory-mismatch:estate"]);
    let alert = &report.alerts[0];
    assert_eq!(alert.severity, Severity::High);
    assert_eq!(alert.current, Some(600.0));
    assert_eq!(alert.prior, Some(580.0));
}

#[tokio::test]
async fn overdue_dispatches_raise_one_alert() {
    let report = run(RecordSet {
        dispatches: (1..=7).map(|day| dispatch(d(6, day), 4.0, None)).collect(),
        ..Default::default()
    })
    .await;

    // Dispatched before 06-13 and still unconfirmed: all seven rows.
    let alert = report
        .alerts
        .iter()
        .find(|a| a.id == "dispatch-unconfirmed:estate")
        .expect("dispatch alert");
    assert_eq!(alert.severity, Severity::Medium);
    assert_eq!(alert.current, Some(7.0));
    assert!(alert.description.contains("2024-06-05"));
    assert!(!alert.description.contains("2024-06-06"));
}

#[tokio::test]
async fn alerts_follow_fixed_detector_order() {
    let mut records = RecordSet {
        processing: vec![processing(d(6, 15), 100.0, 400.0), processing(d(6, 10), 20.0, 480.0)],
        dispatches: vec![
            dispatch(d(6, 16), 20.0, Some(800.0)),
            dispatch(d(6, 9), 20.0, Some(990.0)),
            dispatch(d(6, 1), 3.0, None),
        ],
        sales: vec![sale(d(6, 18), 400.0, 1600.0), sale(d(6, 8), 100.0, 400.0)],
    };
    records.processing.push(output(d(6, 15), 100.0));

    let report = run(records).await;
    assert_eq!(
        ids(&report),
        vec![
            "float-rate-increase:north:arabica",
            "transit-loss-spike:north:arabica",
            "inventory-mismatch:estate",
            "sales-spike:north:arabica:parchment",
            "dispatch-unconfirmed:estate",
            "bag-weight-drift:estate",
        ]
    );
}

#[tokio::test]
async fn repeated_runs_yield_identical_reports() {
    let records = RecordSet {
        processing: vec![processing(d(6, 15), 100.0, 400.0), processing(d(6, 10), 20.0, 480.0)],
        sales: vec![sale(d(6, 18), 600.0, 2400.0)],
        ..Default::default()
    };
    let first = run(records.clone()).await;
    let second = run(records).await;
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first, second);
}

#[tokio::test]
async fn live_report_carries_series_and_comparisons() {
    let report = run(RecordSet {
        processing: vec![
            processing(d(6, 15), 100.0, 400.0),
            ProcessingRecord {
                process_date: d(6, 16),
                location: Some("South".into()),
                coffee_type: Some("Arabica".into()),
                ripe_kgs: Some(1000.0),
                dry_parchment_kgs: Some(150.0),
                ..Default::default()
            },
        ],
        sales: vec![sale(d(6, 20), 10.0, 45.0)],
        ..Default::default()
    })
    .await;

    assert_eq!(report.sparklines.revenue.len(), 7);
    assert_eq!(report.sparklines.revenue[6], 45.0);
    assert_eq!(report.sparklines.avg_price_per_kg[6], 4.5);
    assert_eq!(report.location_comparisons.len(), 2);
    // North has no ripe intake, so its yield is 0 and it sorts first.
    assert_eq!(report.location_comparisons[0].location, "North");
    assert_eq!(report.window.current_start, d(6, 14));
    assert_eq!(report.window.prior_end, d(6, 13));
}

#[tokio::test]
async fn missing_tables_degrade_to_empty_report() {
    let report = ExceptionEngine::run(&MemorySource::without_tables(), &request())
        .await
        .expect("degraded report is a success");

    assert!(report.alerts.is_empty());
    assert!(report.location_comparisons.is_empty());
    assert!(report.sparklines.yield_ratio.is_empty());
    assert!(report.sparklines.loss_pct.is_empty());
    assert!(report.sparklines.avg_price_per_kg.is_empty());
    assert!(report.sparklines.revenue.is_empty());
    for bench in [
        report.benchmarks.this_week,
        report.benchmarks.last_week,
        report.benchmarks.month_to_date,
        report.benchmarks.same_month_last_year,
    ] {
        assert_eq!(bench, Benchmark::default());
    }
}

/// Recursively collect `path: type` for every object key, ignoring array contents.
fn shape(value: &Value, path: &str, out: &mut Vec<String>) {
    if let Value::Object(map) = value {
        for (key, child) in map {
            let p = format!("{path}.{key}");
            let kind = match child {
                Value::Null => "null",
                Value::Bool(_) => "bool",
                Value::Number(_) => "number",
                Value::String(_) => "string",
                Value::Array(_) => "array",
                Value::Object(_) => "object",
            };
            out.push(format!("{p}: {kind}"));
            shape(child, &p, out);
        }
    }
}

#[tokio::test]
async fn degraded_shape_matches_live_shape() {
    let live = run(RecordSet {
        processing: vec![processing(d(6, 15), 100.0, 400.0), processing(d(6, 10), 20.0, 480.0)],
        ..Default::default()
    })
    .await;
    let degraded = ExceptionEngine::run(&MemorySource::without_tables(), &request())
        .await
        .unwrap();

    let mut live_shape = Vec::new();
    shape(&serde_json::to_value(&live).unwrap(), "", &mut live_shape);
    let mut degraded_shape = Vec::new();
    shape(&serde_json::to_value(&degraded).unwrap(), "", &mut degraded_shape);
    assert_eq!(live_shape, degraded_shape);
}

#[tokio::test]
async fn read_failure_aborts_the_run() {
    let result = ExceptionEngine::run(&MemorySource::failing("connection reset"), &request()).await;
    assert_eq!(result, Err(SourceError::Read("connection reset".into())));
}

#[tokio::test]
async fn tenant_overrides_change_outcomes() {
    let records = RecordSet {
        processing: vec![processing(d(6, 15), 100.0, 400.0), processing(d(6, 10), 20.0, 480.0)],
        ..Default::default()
    };
    let mut req = request();
    req.thresholds = ThresholdConfig::resolve(Some(&json!({ "minKgsForSignal": 1000 })));
    let report = ExceptionEngine::run(&MemorySource::new(records), &req).await.unwrap();
    assert!(report.alerts.is_empty());
    assert_eq!(report.thresholds.min_kgs_for_signal, 1000.0);
}

#[tokio::test]
async fn zero_and_null_quantities_stay_finite() {
    let zero_processing = |day| ProcessingRecord {
        process_date: day,
        location: Some("North".into()),
        coffee_type: Some("Arabica".into()),
        float_kgs: Some(0.0),
        green_kgs: Some(0.0),
        ripe_kgs: Some(0.0),
        dry_parchment_kgs: None,
        dry_cherry_kgs: Some(0.0),
    };
    let null_processing = |day| ProcessingRecord {
        process_date: day,
        location: None,
        coffee_type: None,
        ..Default::default()
    };
    let zero_sale = |day| SalesRecord {
        sale_date: day,
        location: Some("North".into()),
        coffee_type: Some("Arabica".into()),
        bag_type: None,
        bags_sold: Some(0.0),
        kgs_sold: Some(0.0),
        revenue: None,
    };

    // Current week, prior week, baseline, month to date and last year's month.
    let days = [d(6, 18), d(6, 14), d(6, 10), d(5, 2), d(6, 3)];
    let mut records = RecordSet::default();
    for day in days {
        records.processing.push(zero_processing(day));
        records.processing.push(null_processing(day));
        records.dispatches.push(dispatch(day, 0.0, Some(0.0)));
        records.sales.push(zero_sale(day));
    }
    let last_year = NaiveDate::from_ymd_opt(2023, 6, 12).unwrap();
    records.processing.push(zero_processing(last_year));
    records.sales.push(zero_sale(last_year));
    // Unconfirmed but not yet overdue.
    records.dispatches.push(dispatch(d(6, 19), 0.0, None));

    let report = run(records).await;

    assert!(report.alerts.is_empty(), "unexpected alerts: {:?}", ids(&report));
    for bench in [
        report.benchmarks.this_week,
        report.benchmarks.last_week,
        report.benchmarks.month_to_date,
        report.benchmarks.same_month_last_year,
    ] {
        for value in [
            bench.yield_ratio,
            bench.float_rate,
            bench.loss_pct,
            bench.avg_price_per_kg,
            bench.revenue,
            bench.processed_kgs,
            bench.sold_kgs,
        ] {
            assert!(value.is_finite(), "non-finite benchmark in {bench:?}");
        }
    }
    let lines = &report.sparklines;
    assert_eq!(lines.revenue.len(), 7);
    for series in [&lines.yield_ratio, &lines.loss_pct, &lines.avg_price_per_kg, &lines.revenue] {
        assert!(series.iter().all(|v| v.is_finite()), "non-finite sparkline {series:?}");
    }
    for cmp in &report.location_comparisons {
        assert!(cmp.yield_ratio.is_finite() && cmp.float_rate.is_finite());
        assert!(cmp.yield_delta.is_finite() && cmp.float_delta.is_finite());
    }
}
