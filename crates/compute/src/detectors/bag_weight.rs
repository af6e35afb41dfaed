//! Bag-weight drift: average received kg per bag against the nominal weight.
//!
//! The per-bag average divides by confirmed bags rather than all dispatched
//! bags; unconfirmed shipments have no received weight to average.

use super::{alert_id, pct, Alert, DetectorInput, Severity};
use crate::math::relative_change;

pub const ID: &str = "bag-weight-drift";
const METRIC: &str = "receivedKgsPerBag";

pub fn evaluate(input: &DetectorInput<'_>) -> Option<Alert> {
    let nominal = input.bag_weight_kgs;
    let totals = input.batch.dispatch.current.total();
    if totals.confirmed_bags <= 0.0 || nominal <= 0.0 {
        return None;
    }

    let avg = totals.received_per_bag();
    let drift = relative_change(avg, nominal);
    if drift.abs() <= input.thresholds.bag_weight_drift_pct {
        return None;
    }

    Some(Alert {
        id: alert_id(ID, &["estate"]),
        severity: Severity::Medium,
        title: "Bag weight drift".to_string(),
        description: format!(
            "Confirmed bags averaged {avg:.1} kg received against a nominal {nominal:.1} kg ({}).",
            pct(drift)
        ),
        location: None,
        coffee_type: None,
        metric: METRIC.to_string(),
        current: Some(avg),
        prior: Some(nominal),
        delta_pct: Some(drift),
    })
}
