//! Rule Evaluator Set.
//!
//! Each detector is a pure function from aggregated inputs plus thresholds
//! to zero or one [`Alert`] per grouping key. Detectors run independently;
//! one key may trip several of them.
//!
//! Sub-modules, in evaluation order:
//! - [`float_rate`]: week-over-week increase and baseline z-score
//! - [`drying_yield`]: week-over-week drop and baseline z-score
//! - [`transit`]: dispatched vs received loss spike
//! - [`inventory`]: sold exceeds processed
//! - [`sales`]: week-over-week sales spike
//! - [`dispatch_lag`]: overdue unconfirmed dispatches
//! - [`bag_weight`]: received kg per bag drifting from nominal

pub mod bag_weight;
pub mod dispatch_lag;
pub mod drying_yield;
pub mod float_rate;
pub mod inventory;
pub mod sales;
pub mod transit;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use estate_core::LocationCoffee;

use crate::aggregator::AggregateBatch;
use crate::baseline::BaselineStatistic;
use crate::math::z_score;
use crate::thresholds::ThresholdConfig;

/// Alert severity. Ordering is low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One exception raised by a detector.
///
/// `id` is a slug of detector name and grouping key, so the same condition
/// yields the same id on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coffee_type: Option<String>,
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_pct: Option<f64>,
}

/// Everything a detector may read. Borrowed, never mutated.
pub struct DetectorInput<'a> {
    pub batch: &'a AggregateBatch,
    pub thresholds: &'a ThresholdConfig,
    pub baselines: &'a BTreeMap<LocationCoffee, BaselineStatistic>,
    pub bag_weight_kgs: f64,
}

/// Run every detector in the fixed order and concatenate their output.
///
/// The order defines the output list order; nothing is re-sorted.
pub fn evaluate_all(input: &DetectorInput<'_>) -> Vec<Alert> {
    let mut alerts = Vec::new();
    alerts.extend(float_rate::evaluate(input));
    alerts.extend(drying_yield::evaluate(input));
    alerts.extend(transit::evaluate(input));
    alerts.extend(inventory::evaluate(input));
    alerts.extend(sales::evaluate(input));
    alerts.extend(dispatch_lag::evaluate(input));
    alerts.extend(bag_weight::evaluate(input));
    alerts
}

/// Deterministic alert id: `detector:part:part`, each part slugified.
pub fn alert_id(detector: &str, parts: &[&str]) -> String {
    let mut id = detector.to_string();
    for part in parts {
        id.push(':');
        id.push_str(&slugify(part));
    }
    id
}

/// Lowercase ASCII alphanumerics; every other run of characters becomes one `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() { "none".to_string() } else { slug }
}

/// Severity for a z-score that already cleared `threshold`.
pub fn z_severity(z: f64, threshold: f64) -> Severity {
    if z.abs() >= threshold + 1.0 { Severity::High } else { Severity::Medium }
}

/// Shared z-score rule: fires when the baseline has spread, the current
/// denominator clears the signal floor, and `|z| >= threshold`.
pub(crate) fn z_score_check(
    current_value: f64,
    current_denominator: f64,
    baseline_mean: f64,
    baseline_std: f64,
    thresholds: &ThresholdConfig,
) -> Option<(f64, Severity)> {
    if current_denominator < thresholds.min_kgs_for_signal {
        return None;
    }
    let z = z_score(current_value, baseline_mean, baseline_std)?;
    if z.abs() < thresholds.z_score_threshold {
        return None;
    }
    Some((z, z_severity(z, thresholds.z_score_threshold)))
}

pub(crate) fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalises_labels() {
        assert_eq!(slugify("North Block"), "north-block");
        assert_eq!(slugify("  Arabica / Washed  "), "arabica-washed");
        assert_eq!(slugify("---"), "none");
    }

    #[test]
    fn alert_id_is_stable() {
        let a = alert_id("float-rate-increase", &["North", "Arabica"]);
        let b = alert_id("float-rate-increase", &["North", "Arabica"]);
        assert_eq!(a, "float-rate-increase:north:arabica");
        assert_eq!(a, b);
    }

    #[test]
    fn z_severity_boundaries() {
        assert_eq!(z_severity(2.0, 2.0), Severity::Medium);
        assert_eq!(z_severity(2.99, 2.0), Severity::Medium);
        assert_eq!(z_severity(3.0, 2.0), Severity::High);
        assert_eq!(z_severity(-3.0, 2.0), Severity::High);
        assert_eq!(z_severity(-2.5, 2.0), Severity::Medium);
    }

    #[test]
    fn z_score_check_gates() {
        let t = ThresholdConfig::default();
        // Below threshold: nothing.
        assert!(z_score_check(0.06, 500.0, 0.05, 0.01, &t).is_none());
        // Zero spread: nothing.
        assert!(z_score_check(0.5, 500.0, 0.05, 0.0, &t).is_none());
        // Signal floor not met: nothing.
        assert!(z_score_check(0.09, 10.0, 0.05, 0.01, &t).is_none());
        // Exactly at threshold: medium.
        let (z, sev) = z_score_check(1.0, 500.0, 0.5, 0.25, &t).unwrap();
        assert_eq!(z, 2.0);
        assert_eq!(sev, Severity::Medium);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
    }
}
