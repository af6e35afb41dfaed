//! Baseline Statistics Calculator.
//!
//! Converts per-day processing sums over the baseline range into weekly
//! float-rate and yield series per (location, coffee type), then computes
//! mean and population standard deviation for the z-score detectors.

use std::collections::BTreeMap;

use chrono::{Datelike, IsoWeek, NaiveDate};
use serde::Serialize;

use estate_core::LocationCoffee;

use crate::math::{mean, population_std_dev};
use crate::metrics::{MetricWindow, ProcessingTotals};

/// Historical reference distribution for one (location, coffee type).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineStatistic {
    /// Distinct ISO weeks with any processing row.
    pub weeks: usize,
    pub mean_float_rate: f64,
    pub std_float_rate: f64,
    pub mean_yield: f64,
    pub std_yield: f64,
}

/// Compute baselines for every pair with at least one week of activity.
///
/// Weeks whose float or yield denominator is zero contribute a ratio of 0;
/// they are never dropped from the sample. Pairs with no weeks get no entry.
pub fn compute_baselines(
    window: &MetricWindow<(NaiveDate, LocationCoffee), ProcessingTotals>,
) -> BTreeMap<LocationCoffee, BaselineStatistic> {
    let mut weekly: BTreeMap<&LocationCoffee, BTreeMap<IsoWeek, ProcessingTotals>> = BTreeMap::new();
    for ((day, key), totals) in &window.groups {
        *weekly
            .entry(key)
            .or_default()
            .entry(day.iso_week())
            .or_default() += *totals;
    }

    weekly
        .into_iter()
        .filter(|(_, weeks)| !weeks.is_empty())
        .map(|(key, weeks)| {
            let float_rates: Vec<f64> = weeks.values().map(ProcessingTotals::float_rate).collect();
            let yields: Vec<f64> = weeks.values().map(ProcessingTotals::yield_ratio).collect();
            let stat = BaselineStatistic {
                weeks: weeks.len(),
                mean_float_rate: mean(&float_rates),
                std_float_rate: population_std_dev(&float_rates),
                mean_yield: mean(&yields),
                std_yield: population_std_dev(&yields),
            };
            (key.clone(), stat)
        })
        .collect()
}
