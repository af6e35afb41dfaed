//! Dry-parchment yield detectors: week-over-week drop and baseline z-score.

use estate_core::LocationCoffee;

use super::{alert_id, pct, z_score_check, Alert, DetectorInput, Severity};
use crate::baseline::BaselineStatistic;
use crate::math::relative_change;
use crate::metrics::ProcessingTotals;
use crate::thresholds::ThresholdConfig;

pub const DROP_ID: &str = "yield-drop";
pub const ANOMALY_ID: &str = "yield-anomaly";
const METRIC: &str = "yieldRatio";

pub fn evaluate(input: &DetectorInput<'_>) -> Vec<Alert> {
    let current = &input.batch.processing.current;
    let prior = &input.batch.processing.prior;

    let mut alerts = Vec::new();
    for (key, cur) in &current.groups {
        let prev = prior.get(key);
        if let Some(alert) = week_drop(key, cur, &prev, input.thresholds) {
            alerts.push(alert);
        }
        if let Some(stat) = input.baselines.get(key) {
            if let Some(alert) = anomaly(key, cur, stat, input.thresholds) {
                alerts.push(alert);
            }
        }
    }
    alerts
}

fn week_drop(
    key: &LocationCoffee,
    current: &ProcessingTotals,
    prior: &ProcessingTotals,
    t: &ThresholdConfig,
) -> Option<Alert> {
    if current.ripe_kgs < t.min_kgs_for_signal || prior.ripe_kgs < t.min_kgs_for_signal {
        return None;
    }
    let cur_yield = current.yield_ratio();
    let prior_yield = prior.yield_ratio();
    if prior_yield <= 0.0 || cur_yield >= prior_yield * (1.0 - t.yield_drop_pct) {
        return None;
    }

    let delta = relative_change(cur_yield, prior_yield);
    Some(Alert {
        id: alert_id(DROP_ID, &[&key.location, &key.coffee_type]),
        severity: Severity::High,
        title: format!("Drying yield down at {key}"),
        description: format!(
            "Dry parchment yield fell from {} to {} week over week ({}).",
            pct(prior_yield),
            pct(cur_yield),
            pct(delta)
        ),
        location: Some(key.location.clone()),
        coffee_type: Some(key.coffee_type.clone()),
        metric: METRIC.to_string(),
        current: Some(cur_yield),
        prior: Some(prior_yield),
        delta_pct: Some(delta),
    })
}

fn anomaly(
    key: &LocationCoffee,
    current: &ProcessingTotals,
    stat: &BaselineStatistic,
    t: &ThresholdConfig,
) -> Option<Alert> {
    let cur_yield = current.yield_ratio();
    let (z, severity) = z_score_check(cur_yield, current.ripe_kgs, stat.mean_yield, stat.std_yield, t)?;

    Some(Alert {
        id: alert_id(ANOMALY_ID, &[&key.location, &key.coffee_type]),
        severity,
        title: format!("Unusual drying yield at {key}"),
        description: format!(
            "Yield {} is {:.1} standard deviations from the {}-week baseline mean of {}.",
            pct(cur_yield),
            z,
            stat.weeks,
            pct(stat.mean_yield)
        ),
        location: Some(key.location.clone()),
        coffee_type: Some(key.coffee_type.clone()),
        metric: METRIC.to_string(),
        current: Some(cur_yield),
        prior: Some(stat.mean_yield),
        delta_pct: Some(relative_change(cur_yield, stat.mean_yield)),
    })
}
