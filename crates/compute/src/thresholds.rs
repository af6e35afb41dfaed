//! Threshold Resolver: tenant overrides merged over immutable defaults.
//!
//! Merge rules:
//! - top-level keys replace the default field by field (null means "not set");
//! - `targets` is merged key by key, defaults fill missing or null keys;
//! - any other nested value (e.g. `limits`) replaces the default wholesale.
//!
//! A blob that cannot be parsed or does not fit the schema is logged and
//! ignored; resolution never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Fallback when `limits.dispatchSamples` is null.
pub const DEFAULT_DISPATCH_SAMPLES: usize = 5;
/// Fallback when `limits.locationComparisons` is null.
pub const DEFAULT_LOCATION_COMPARISONS: usize = 5;
/// Fallback when `limits.sparklinePoints` is null.
pub const DEFAULT_SPARKLINE_POINTS: usize = 7;

const TARGETS_KEY: &str = "targets";

/// Largest accepted `baselineWeeks` (ten years).
pub const MAX_BASELINE_WEEKS: u32 = 520;
/// Largest accepted `dispatchUnconfirmedDays` (ten years).
pub const MAX_UNCONFIRMED_DAYS: u32 = 3650;
/// Largest accepted value for each `limits` entry.
pub const MAX_LIMIT: usize = 100;

/// Fully resolved detector thresholds for one tenant.
///
/// All `*_pct` values are fractions (0.15 = 15%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdConfig {
    pub float_rate_increase_pct: f64,
    pub yield_drop_pct: f64,
    pub loss_spike_abs_pct: f64,
    pub loss_spike_rel_pct: f64,
    /// Minimum denominator (kg) before a ratio is trusted.
    pub min_kgs_for_signal: f64,
    pub mismatch_buffer_kgs: f64,
    pub dispatch_unconfirmed_days: u32,
    pub bag_weight_drift_pct: f64,
    pub z_score_threshold: f64,
    pub baseline_weeks: u32,
    pub targets: Targets,
    pub limits: Limits,
}

/// Tenant performance targets, surfaced beside benchmarks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Targets {
    pub yield_ratio: Option<f64>,
    pub loss_pct: Option<f64>,
    pub avg_price_per_kg: Option<f64>,
    pub float_rate: Option<f64>,
}

/// Output size limits. Null entries fall back to the built-in constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub dispatch_samples: Option<usize>,
    pub location_comparisons: Option<usize>,
    pub sparkline_points: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            dispatch_samples: Some(DEFAULT_DISPATCH_SAMPLES),
            location_comparisons: Some(DEFAULT_LOCATION_COMPARISONS),
            sparkline_points: Some(DEFAULT_SPARKLINE_POINTS),
        }
    }
}

impl Limits {
    pub fn dispatch_samples(&self) -> usize {
        self.dispatch_samples.unwrap_or(DEFAULT_DISPATCH_SAMPLES)
    }

    pub fn location_comparisons(&self) -> usize {
        self.location_comparisons.unwrap_or(DEFAULT_LOCATION_COMPARISONS)
    }

    pub fn sparkline_points(&self) -> usize {
        self.sparkline_points.unwrap_or(DEFAULT_SPARKLINE_POINTS)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            float_rate_increase_pct: 0.15,
            yield_drop_pct: 0.10,
            loss_spike_abs_pct: 0.02,
            loss_spike_rel_pct: 0.50,
            min_kgs_for_signal: 50.0,
            mismatch_buffer_kgs: 5.0,
            dispatch_unconfirmed_days: 7,
            bag_weight_drift_pct: 0.05,
            z_score_threshold: 2.0,
            baseline_weeks: 8,
            targets: Targets::default(),
            limits: Limits::default(),
        }
    }
}

impl ThresholdConfig {
    /// Resolve a stored tenant blob against the system defaults.
    ///
    /// `stored` may be absent, JSON null, a JSON string holding serialized
    /// JSON, or an already structured object.
    pub fn resolve(stored: Option<&Value>) -> Self {
        Self::resolve_with(&Self::default(), stored)
    }

    /// Resolve against explicit defaults.
    pub fn resolve_with(defaults: &Self, stored: Option<&Value>) -> Self {
        let overrides = match parse_overrides(stored) {
            Ok(Some(map)) => map,
            Ok(None) => return defaults.clone(),
            Err(reason) => {
                warn!(reason = %reason, "ignoring malformed threshold overrides, using defaults");
                return defaults.clone();
            }
        };

        let mut base = match serde_json::to_value(defaults) {
            Ok(Value::Object(map)) => map,
            _ => return defaults.clone(),
        };
        merge_overrides(&mut base, overrides);

        match serde_json::from_value::<Self>(Value::Object(base)) {
            Ok(resolved) => resolved.within_bounds(defaults),
            Err(e) => {
                warn!(error = %e, "threshold overrides do not fit the schema, using defaults");
                defaults.clone()
            }
        }
    }
}

/// Turn the stored blob into an override map. `Ok(None)` means "no overrides".
fn parse_overrides(stored: Option<&Value>) -> Result<Option<Map<String, Value>>, String> {
    let value = match stored {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(raw)) => {
            if raw.trim().is_empty() {
                return Ok(None);
            }
            serde_json::from_str::<Value>(raw).map_err(|e| format!("invalid JSON: {e}"))?
        }
        Some(other) => other.clone(),
    };

    match value {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        other => Err(format!("expected an object, got {}", json_kind(&other))),
    }
}

impl ThresholdConfig {
    /// Out-of-range window lengths and limits fall back to the defaults.
    fn within_bounds(mut self, defaults: &Self) -> Self {
        if !(1..=MAX_BASELINE_WEEKS).contains(&self.baseline_weeks) {
            warn!(value = self.baseline_weeks, "baselineWeeks out of range, using default");
            self.baseline_weeks = defaults.baseline_weeks;
        }
        if self.dispatch_unconfirmed_days > MAX_UNCONFIRMED_DAYS {
            warn!(
                value = self.dispatch_unconfirmed_days,
                "dispatchUnconfirmedDays out of range, using default"
            );
            self.dispatch_unconfirmed_days = defaults.dispatch_unconfirmed_days;
        }
        bound_limit(&mut self.limits.dispatch_samples, DEFAULT_DISPATCH_SAMPLES, "dispatchSamples");
        bound_limit(
            &mut self.limits.location_comparisons,
            DEFAULT_LOCATION_COMPARISONS,
            "locationComparisons",
        );
        bound_limit(&mut self.limits.sparkline_points, DEFAULT_SPARKLINE_POINTS, "sparklinePoints");
        self
    }
}

fn bound_limit(limit: &mut Option<usize>, fallback: usize, name: &str) {
    if let Some(value) = *limit {
        if value > MAX_LIMIT {
            warn!(limit = name, value, "limit out of range, using default");
            *limit = Some(fallback);
        }
    }
}

fn merge_overrides(base: &mut Map<String, Value>, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        if value.is_null() {
            continue;
        }
        if key == TARGETS_KEY {
            if let (Some(Value::Object(base_targets)), Value::Object(over_targets)) =
                (base.get_mut(TARGETS_KEY), &value)
            {
                for (tk, tv) in over_targets {
                    if !tv.is_null() {
                        base_targets.insert(tk.clone(), tv.clone());
                    }
                }
                continue;
            }
        }
        base.insert(key, value);
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
