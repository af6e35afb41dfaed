//! OpenAPI documentation aggregator.
//!
//! Collects the `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI 3.1 document, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "estate-exceptions API",
        version = "0.1.0",
        description = "Exception and anomaly detection over estate processing, dispatch and sales records.",
    ),
    tags(
        (name = "Health", description = "Server liveness"),
        (name = "Exceptions", description = "Alerts, benchmarks, sparklines and location comparisons"),
    ),
    paths(
        crate::api::health::health,
        crate::api::exceptions::get_exceptions,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        estate_compute::ExceptionsReport,
        estate_compute::WindowSummary,
        estate_compute::Alert,
        estate_compute::Severity,
        estate_compute::ThresholdConfig,
        estate_compute::Targets,
        estate_compute::Limits,
        estate_compute::BenchmarkSet,
        estate_compute::Benchmark,
        estate_compute::Sparklines,
        estate_compute::LocationComparison,
    ))
)]
pub struct ApiDoc;
