//! Dispatch confirmation lag: shipments with no received weight past the grace period.

use super::{alert_id, Alert, DetectorInput, Severity};
use crate::source::UnconfirmedDispatch;

pub const ID: &str = "dispatch-unconfirmed";
const METRIC: &str = "unconfirmedDispatches";

/// One estate-wide alert when any dispatch is overdue.
pub fn evaluate(input: &DetectorInput<'_>) -> Option<Alert> {
    let summary = &input.batch.unconfirmed;
    if summary.count == 0 {
        return None;
    }
    let days = input.thresholds.dispatch_unconfirmed_days;
    let limit = input.thresholds.limits.dispatch_samples();

    let sample = summary
        .oldest
        .iter()
        .take(limit)
        .map(describe)
        .collect::<Vec<_>>()
        .join("; ");

    let mut description = format!(
        "{} dispatch{} older than {days} days with no received weight recorded.",
        summary.count,
        if summary.count == 1 { "" } else { "es" }
    );
    if !sample.is_empty() {
        description.push_str(" Oldest: ");
        description.push_str(&sample);
        description.push('.');
    }

    Some(Alert {
        id: alert_id(ID, &["estate"]),
        severity: Severity::Medium,
        title: "Unconfirmed dispatches".to_string(),
        description,
        location: None,
        coffee_type: None,
        metric: METRIC.to_string(),
        current: Some(summary.count as f64),
        prior: None,
        delta_pct: None,
    })
}

fn describe(d: &UnconfirmedDispatch) -> String {
    format!("{} {} {} ({} bags)", d.dispatch_date, d.location, d.coffee_type, d.bags)
}
