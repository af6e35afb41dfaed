//! Float rate detectors: week-over-week increase and baseline z-score.
//!
//! Float rate = float / (green + float). A rising rate means more intake is
//! rejected at flotation.

use estate_core::LocationCoffee;

use super::{alert_id, pct, z_score_check, Alert, DetectorInput, Severity};
use crate::baseline::BaselineStatistic;
use crate::math::relative_change;
use crate::metrics::ProcessingTotals;
use crate::thresholds::ThresholdConfig;

pub const INCREASE_ID: &str = "float-rate-increase";
pub const ANOMALY_ID: &str = "float-rate-anomaly";
const METRIC: &str = "floatRate";

/// Per (location, coffee type): the increase rule, then the z-score rule.
pub fn evaluate(input: &DetectorInput<'_>) -> Vec<Alert> {
    let current = &input.batch.processing.current;
    let prior = &input.batch.processing.prior;

    let mut alerts = Vec::new();
    for (key, cur) in &current.groups {
        let prev = prior.get(key);
        if let Some(alert) = increase(key, cur, &prev, input.thresholds) {
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

fn increase(
    key: &LocationCoffee,
    current: &ProcessingTotals,
    prior: &ProcessingTotals,
    t: &ThresholdConfig,
) -> Option<Alert> {
    if current.float_intake_kgs() < t.min_kgs_for_signal || prior.float_intake_kgs() < t.min_kgs_for_signal {
        return None;
    }
    let cur_rate = current.float_rate();
    let prior_rate = prior.float_rate();
    if prior_rate <= 0.0 || cur_rate <= prior_rate * (1.0 + t.float_rate_increase_pct) {
        return None;
    }

    let delta = relative_change(cur_rate, prior_rate);
    Some(Alert {
        id: alert_id(INCREASE_ID, &[&key.location, &key.coffee_type]),
        severity: Severity::Medium,
        title: format!("Float rate up at {key}"),
        description: format!(
            "Float rate rose from {} to {} week over week (+{}), above the {} tolerance.",
            pct(prior_rate),
            pct(cur_rate),
            pct(delta),
            pct(t.float_rate_increase_pct)
        ),
        location: Some(key.location.clone()),
        coffee_type: Some(key.coffee_type.clone()),
        metric: METRIC.to_string(),
        current: Some(cur_rate),
        prior: Some(prior_rate),
        delta_pct: Some(delta),
    })
}

fn anomaly(
    key: &LocationCoffee,
    current: &ProcessingTotals,
    stat: &BaselineStatistic,
    t: &ThresholdConfig,
) -> Option<Alert> {
    let cur_rate = current.float_rate();
    let (z, severity) = z_score_check(
        cur_rate,
        current.float_intake_kgs(),
        stat.mean_float_rate,
        stat.std_float_rate,
        t,
    )?;

    Some(Alert {
        id: alert_id(ANOMALY_ID, &[&key.location, &key.coffee_type]),
        severity,
        title: format!("Unusual float rate at {key}"),
        description: format!(
            "Float rate {} is {:.1} standard deviations from the {}-week baseline mean of {}.",
            pct(cur_rate),
            z,
            stat.weeks,
            pct(stat.mean_float_rate)
        ),
        location: Some(key.location.clone()),
        coffee_type: Some(key.coffee_type.clone()),
        metric: METRIC.to_string(),
        current: Some(cur_rate),
        prior: Some(stat.mean_float_rate),
        delta_pct: Some(relative_change(cur_rate, stat.mean_float_rate)),
    })
}
