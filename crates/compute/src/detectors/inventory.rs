//! Inventory mismatch: more sold than processed, estate-wide, in the current week.

use super::{alert_id, Alert, DetectorInput, Severity};
use crate::math::relative_change;

pub const ID: &str = "inventory-mismatch";
const METRIC: &str = "soldKgs";

pub fn evaluate(input: &DetectorInput<'_>) -> Option<Alert> {
    let sold = input.batch.sales.current.total().sold_kgs;
    let processed = input.batch.processing.current.total().processed_kgs();
    let buffer = input.thresholds.mismatch_buffer_kgs;

    if sold <= processed + buffer {
        return None;
    }

    Some(Alert {
        id: alert_id(ID, &["estate"]),
        severity: Severity::High,
        title: "Sales exceed processed output".to_string(),
        description: format!(
            "{sold:.0} kg sold this week against {processed:.0} kg processed (dry parchment plus dry cherry), \
             {:.0} kg over with a {buffer:.0} kg buffer.",
            sold - processed
        ),
        location: None,
        coffee_type: None,
        metric: METRIC.to_string(),
        current: Some(sold),
        prior: Some(processed),
        delta_pct: Some(relative_change(sold, processed)),
    })
}
