//! Transit loss spike: shortfall between dispatched and received weight.
//!
//! Only confirmed shipments (those with a received weight) enter the loss
//! figure. A key with no confirmed weight in either week is skipped.
//! The signal gate is therefore confirmed kg, not all dispatched kg, so a
//! shipment still in transit never reads as lost.

use super::{alert_id, pct, Alert, DetectorInput, Severity};

pub const ID: &str = "transit-loss-spike";
const METRIC: &str = "lossPct";

pub fn evaluate(input: &DetectorInput<'_>) -> Vec<Alert> {
    let t = input.thresholds;
    let bw = input.bag_weight_kgs;
    let prior = &input.batch.dispatch.prior;

    input
        .batch
        .dispatch
        .current
        .groups
        .iter()
        .filter_map(|(key, cur)| {
            let prev = prior.get(key);
            if cur.confirmed_kgs(bw) <= 0.0 || prev.confirmed_kgs(bw) <= 0.0 {
                return None;
            }
            let cur_loss = cur.loss_pct(bw);
            let prior_loss = prev.loss_pct(bw);

            let abs_margin = cur_loss > prior_loss + t.loss_spike_abs_pct;
            let rel_margin = prior_loss > 0.0 && cur_loss > prior_loss * (1.0 + t.loss_spike_rel_pct);
            if !(abs_margin || rel_margin) {
                return None;
            }

            let delta = cur_loss - prior_loss;
            Some(Alert {
                id: alert_id(ID, &[&key.location, &key.coffee_type]),
                severity: Severity::High,
                title: format!("Transit loss spike for {key}"),
                description: format!(
                    "Transit loss rose from {} to {} ({} kg received of {} kg dispatched).",
                    pct(prior_loss),
                    pct(cur_loss),
                    cur.received_kgs,
                    cur.confirmed_kgs(bw)
                ),
                location: Some(key.location.clone()),
                coffee_type: Some(key.coffee_type.clone()),
                metric: METRIC.to_string(),
                current: Some(cur_loss),
                prior: Some(prior_loss),
                delta_pct: Some(delta),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::detectors::test_support::*;
    use crate::thresholds::ThresholdConfig;

    fn run(batch: &crate::aggregator::AggregateBatch, thresholds: &ThresholdConfig) -> Vec<Alert> {
        evaluate(&DetectorInput {
            batch,
            thresholds,
            baselines: &BTreeMap::new(),
            bag_weight_kgs: 50.0,
        })
    }

    #[test]
    fn absolute_margin_trips() {
        let mut batch = empty_batch();
        // 20 bags x 50kg = 1000kg both weeks.
        batch.dispatch.current.accumulate(north(), dispatch(20.0, 950.0));
        batch.dispatch.prior.accumulate(north(), dispatch(20.0, 990.0));
        let alerts = run(&batch, &ThresholdConfig::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "transit-loss-spike:north:arabica");
        assert_eq!(alerts[0].severity, Severity::High);
        assert!((alerts[0].current.unwrap() - 0.05).abs() < 1e-12);
        assert!((alerts[0].prior.unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn relative_margin_alone_trips() {
        let mut batch = empty_batch();
        // 1.0% -> 2.0%: +1 point (under 2 points absolute) but +100% relative.
        batch.dispatch.current.accumulate(north(), dispatch(20.0, 980.0));
        batch.dispatch.prior.accumulate(north(), dispatch(20.0, 990.0));
        assert_eq!(run(&batch, &ThresholdConfig::default()).len(), 1);
    }

    #[test]
    fn absolute_margin_alone_trips() {
        let mut batch = empty_batch();
        // 10% -> 13%: +3 points absolute, only +30% relative.
        batch.dispatch.current.accumulate(north(), dispatch(20.0, 870.0));
        batch.dispatch.prior.accumulate(north(), dispatch(20.0, 900.0));
        let thresholds = ThresholdConfig::default();
        assert!(0.13 < 0.10 * (1.0 + thresholds.loss_spike_rel_pct));
        assert_eq!(run(&batch, &thresholds).len(), 1);
    }

    #[test]
    fn neither_margin_is_quiet() {
        let mut batch = empty_batch();
        // 10% -> 11%.
        batch.dispatch.current.accumulate(north(), dispatch(20.0, 890.0));
        batch.dispatch.prior.accumulate(north(), dispatch(20.0, 900.0));
        assert!(run(&batch, &ThresholdConfig::default()).is_empty());
    }

    #[test]
    fn skipped_without_confirmed_weight() {
        let mut batch = empty_batch();
        batch.dispatch.current.accumulate(north(), dispatch(20.0, 500.0));
        assert!(run(&batch, &ThresholdConfig::default()).is_empty());

        let mut batch = empty_batch();
        batch.dispatch.current.accumulate(
            north(),
            crate::metrics::DispatchTotals {
                dispatched_bags: 20.0,
                confirmed_bags: 0.0,
                received_kgs: 0.0,
            },
        );
        batch.dispatch.prior.accumulate(north(), dispatch(20.0, 990.0));
        assert!(run(&batch, &ThresholdConfig::default()).is_empty());
    }
}
