//! Strongly-typed summed quantities per grouping key.
//!
//! Every value here has already passed through [`crate::projection`], so all
//! fields are finite and absent inputs are 0.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use serde::Serialize;

use estate_core::DateRange;

use crate::math::divide;

/// Summed processing quantities (kg).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcessingTotals {
    pub float_kgs: f64,
    pub green_kgs: f64,
    pub ripe_kgs: f64,
    pub dry_parchment_kgs: f64,
    pub dry_cherry_kgs: f64,
}

impl ProcessingTotals {
    /// Green plus float intake, the float-rate denominator.
    pub fn float_intake_kgs(&self) -> f64 {
        self.green_kgs + self.float_kgs
    }

    pub fn float_rate(&self) -> f64 {
        divide(self.float_kgs, self.float_intake_kgs())
    }

    /// Dry parchment out per kg of ripe cherry in.
    pub fn yield_ratio(&self) -> f64 {
        divide(self.dry_parchment_kgs, self.ripe_kgs)
    }

    /// Output available to sell: dry parchment plus dry cherry.
    pub fn processed_kgs(&self) -> f64 {
        self.dry_parchment_kgs + self.dry_cherry_kgs
    }
}

impl AddAssign for ProcessingTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.float_kgs += rhs.float_kgs;
        self.green_kgs += rhs.green_kgs;
        self.ripe_kgs += rhs.ripe_kgs;
        self.dry_parchment_kgs += rhs.dry_parchment_kgs;
        self.dry_cherry_kgs += rhs.dry_cherry_kgs;
    }
}

/// Summed dispatch quantities.
///
/// `confirmed_bags` counts only bags whose shipment has a recorded received
/// weight, so loss and bag-weight figures never treat an unconfirmed
/// shipment as lost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DispatchTotals {
    pub dispatched_bags: f64,
    pub confirmed_bags: f64,
    pub received_kgs: f64,
}

impl DispatchTotals {
    pub fn confirmed_kgs(&self, bag_weight_kgs: f64) -> f64 {
        self.confirmed_bags * bag_weight_kgs
    }

    /// Fractional shortfall between confirmed dispatched weight and received weight.
    pub fn loss_pct(&self, bag_weight_kgs: f64) -> f64 {
        let sent = self.confirmed_kgs(bag_weight_kgs);
        divide(sent - self.received_kgs, sent)
    }

    pub fn received_per_bag(&self) -> f64 {
        divide(self.received_kgs, self.confirmed_bags)
    }
}

impl AddAssign for DispatchTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.dispatched_bags += rhs.dispatched_bags;
        self.confirmed_bags += rhs.confirmed_bags;
        self.received_kgs += rhs.received_kgs;
    }
}

/// Summed sales quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SalesTotals {
    pub sold_bags: f64,
    pub sold_kgs: f64,
    pub revenue: f64,
}

impl SalesTotals {
    pub fn avg_price_per_kg(&self) -> f64 {
        divide(self.revenue, self.sold_kgs)
    }
}

impl AddAssign for SalesTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.sold_bags += rhs.sold_bags;
        self.sold_kgs += rhs.sold_kgs;
        self.revenue += rhs.revenue;
    }
}

/// One queried window: a closed date range plus per-key sums.
///
/// Built fresh per request and dropped with it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricWindow<K: Ord, T> {
    pub range: DateRange,
    pub groups: BTreeMap<K, T>,
}

impl<K: Ord, T: Copy + Default + AddAssign> MetricWindow<K, T> {
    pub fn empty(range: DateRange) -> Self {
        Self {
            range,
            groups: BTreeMap::new(),
        }
    }

    /// Add `value` into the bucket for `key`, creating it at zero.
    pub fn accumulate(&mut self, key: K, value: T) {
        *self.groups.entry(key).or_default() += value;
    }

    /// Sums for `key`, zero when the key had no rows.
    pub fn get(&self, key: &K) -> T {
        self.groups.get(key).copied().unwrap_or_default()
    }

    /// Estate-wide sum across every key.
    pub fn total(&self) -> T {
        let mut total = T::default();
        for value in self.groups.values() {
            total += *value;
        }
        total
    }
}
