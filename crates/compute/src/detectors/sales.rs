//! Sales spike per (location, coffee type, bag type).

use super::{alert_id, pct, Alert, DetectorInput, Severity};
use crate::math::relative_change;

pub const ID: &str = "sales-spike";
const METRIC: &str = "soldKgs";

/// Current week must exceed the prior week by this factor.
///
/// Not part of [`crate::thresholds::ThresholdConfig`]; tenant overrides do
/// not move it.
pub const SALES_SPIKE_MULTIPLIER: f64 = 1.6;

pub fn evaluate(input: &DetectorInput<'_>) -> Vec<Alert> {
    let prior = &input.batch.sales.prior;

    input
        .batch
        .sales
        .current
        .groups
        .iter()
        .filter_map(|(key, cur)| {
            let prev = prior.get(key);
            if cur.sold_kgs <= 0.0 || prev.sold_kgs <= 0.0 {
                return None;
            }
            if cur.sold_kgs <= prev.sold_kgs * SALES_SPIKE_MULTIPLIER {
                return None;
            }

            let delta = relative_change(cur.sold_kgs, prev.sold_kgs);
            Some(Alert {
                id: alert_id(ID, &[&key.location, &key.coffee_type, &key.bag_type]),
                severity: Severity::Low,
                title: format!("Sales spike for {key}"),
                description: format!(
                    "{:.0} kg sold this week vs {:.0} kg last week (+{}).",
                    cur.sold_kgs,
                    prev.sold_kgs,
                    pct(delta)
                ),
                location: Some(key.location.clone()),
                coffee_type: Some(key.coffee_type.clone()),
                metric: METRIC.to_string(),
                current: Some(cur.sold_kgs),
                prior: Some(prev.sold_kgs),
                delta_pct: Some(delta),
            })
        })
        .collect()
}
