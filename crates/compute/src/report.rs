//! Alert Assembler: packages detector output, thresholds and benchmarks
//! into the single response object.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::benchmarks::{BenchmarkSet, LocationComparison, Sparklines};
use crate::detectors::Alert;
use crate::thresholds::ThresholdConfig;
use crate::windows::ReportWindows;

/// Bounds of the current and prior comparison windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    pub current_start: NaiveDate,
    pub current_end: NaiveDate,
    pub prior_start: NaiveDate,
    pub prior_end: NaiveDate,
}

impl From<&ReportWindows> for WindowSummary {
    fn from(w: &ReportWindows) -> Self {
        Self {
            current_start: w.current.start,
            current_end: w.current.end,
            prior_start: w.prior.start,
            prior_end: w.prior.end,
        }
    }
}

/// The exceptions response. Live and degraded reports share this exact shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionsReport {
    pub window: WindowSummary,
    pub thresholds: ThresholdConfig,
    pub benchmarks: BenchmarkSet,
    pub sparklines: Sparklines,
    pub location_comparisons: Vec<LocationComparison>,
    /// Detector output in evaluation order.
    pub alerts: Vec<Alert>,
}

impl ExceptionsReport {
    pub fn assemble(
        windows: &ReportWindows,
        thresholds: ThresholdConfig,
        benchmarks: BenchmarkSet,
        sparklines: Sparklines,
        location_comparisons: Vec<LocationComparison>,
        alerts: Vec<Alert>,
    ) -> Self {
        Self {
            window: windows.into(),
            thresholds,
            benchmarks,
            sparklines,
            location_comparisons,
            alerts,
        }
    }

    /// Response for a tenant whose record tables do not exist yet:
    /// zero benchmarks, empty series, no alerts.
    pub fn degraded(windows: &ReportWindows, thresholds: ThresholdConfig) -> Self {
        let benchmarks = BenchmarkSet {
            targets: thresholds.targets.clone(),
            ..BenchmarkSet::default()
        };
        Self::assemble(
            windows,
            thresholds,
            benchmarks,
            Sparklines::default(),
            Vec::new(),
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::Benchmark;

    #[test]
    fn degraded_report_is_zeroed() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        let windows = ReportWindows::plan(today, 8);
        let report = ExceptionsReport::degraded(&windows, ThresholdConfig::default());

        assert!(report.alerts.is_empty());
        assert!(report.location_comparisons.is_empty());
        assert!(report.sparklines.revenue.is_empty());
        assert_eq!(report.benchmarks.this_week, Benchmark::default());
        assert_eq!(report.benchmarks.same_month_last_year, Benchmark::default());
        assert_eq!(report.window.current_end, today);
    }

    #[test]
    fn serializes_with_camel_case_top_level_keys() {
        let windows = ReportWindows::plan(NaiveDate::from_ymd_opt(2024, 6, 20).unwrap(), 8);
        let value = serde_json::to_value(ExceptionsReport::degraded(&windows, ThresholdConfig::default())).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["alerts", "benchmarks", "locationComparisons", "sparklines", "thresholds", "window"]
        );
        assert_eq!(value["window"]["currentStart"], "2024-06-14");
        assert_eq!(value["benchmarks"]["thisWeek"]["yieldRatio"], 0.0);
    }
}
