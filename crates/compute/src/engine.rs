use std::time::Instant;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::aggregator;
use crate::baseline::compute_baselines;
use crate::benchmarks::{build_benchmarks, build_sparklines, compare_locations};
use crate::detectors::{evaluate_all, DetectorInput};
use crate::report::ExceptionsReport;
use crate::source::{RecordSource, SourceError};
use crate::thresholds::ThresholdConfig;
use crate::windows::ReportWindows;

/// Per-request inputs, already resolved from tenant configuration.
#[derive(Debug, Clone)]
pub struct ExceptionRequest {
    /// Reference date; every window ends on or before it.
    pub today: NaiveDate,
    /// Nominal kg per dispatched bag.
    pub bag_weight_kgs: f64,
    pub thresholds: ThresholdConfig,
}

/// Stateless exception computation. Holds nothing between calls.
pub struct ExceptionEngine;

impl ExceptionEngine {
    /// Fetch one window batch from `source` and compute the full report.
    ///
    /// A missing-schema failure degrades to an all-zero report; any other
    /// read failure aborts the whole computation.
    pub async fn run(
        source: &dyn RecordSource,
        request: &ExceptionRequest,
    ) -> Result<ExceptionsReport, SourceError> {
        let start = Instant::now();
        let thresholds = &request.thresholds;
        let windows = ReportWindows::plan(request.today, thresholds.baseline_weeks);

        let batch = match aggregator::collect(
            source,
            &windows,
            thresholds.dispatch_unconfirmed_days,
            thresholds.limits.dispatch_samples(),
        )
        .await
        {
            Ok(batch) => batch,
            Err(SourceError::SchemaMissing(detail)) => {
                warn!(detail = %detail, "record tables missing, returning empty report");
                return Ok(ExceptionsReport::degraded(&windows, thresholds.clone()));
            }
            Err(e) => return Err(e),
        };

        let baselines = compute_baselines(&batch.baseline);
        let alerts = evaluate_all(&DetectorInput {
            batch: &batch,
            thresholds,
            baselines: &baselines,
            bag_weight_kgs: request.bag_weight_kgs,
        });

        let benchmarks = build_benchmarks(&batch, request.bag_weight_kgs, &thresholds.targets);
        let sparklines = build_sparklines(&batch, request.bag_weight_kgs, &thresholds.limits);
        let comparisons = compare_locations(&batch, &thresholds.limits);

        info!(
            today = %request.today,
            alerts = alerts.len(),
            baselines = baselines.len(),
            "Exceptions computed in {:.1}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(ExceptionsReport::assemble(
            &windows,
            thresholds.clone(),
            benchmarks,
            sparklines,
            comparisons,
            alerts,
        ))
    }
}
