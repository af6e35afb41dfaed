//! Exception engine for estate processing, dispatch and sales records.
//!
//! One request flows through:
//! thresholds → [`windows`] → [`aggregator`] (fork-join reads) →
//! [`baseline`] + [`detectors`] + [`benchmarks`] → [`report`].

pub mod aggregator;
pub mod baseline;
pub mod benchmarks;
pub mod detectors;
pub mod engine;
pub mod math;
pub mod memory;
pub mod metrics;
pub mod projection;
pub mod report;
pub mod source;
pub mod thresholds;
pub mod windows;

pub use benchmarks::{Benchmark, BenchmarkSet, LocationComparison, Sparklines};
pub use detectors::{Alert, Severity};
pub use engine::{ExceptionEngine, ExceptionRequest};
pub use memory::{MemorySource, RecordSet};
pub use report::{ExceptionsReport, WindowSummary};
pub use source::{Grain, RecordSource, SourceError};
pub use thresholds::{Limits, Targets, ThresholdConfig};
pub use windows::ReportWindows;
