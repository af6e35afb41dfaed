use thiserror::Error;

/// Request-level failures surfaced by the exceptions service.
///
/// Detector edge cases (zero denominators, missing baselines) never reach
/// this type; they resolve to "no alert".
#[derive(Error, Debug)]
pub enum EstateError {
    #[error("Access denied: module '{0}' is not enabled for this tenant")]
    AccessDenied(String),

    #[error("Missing tenant context: {0}")]
    MissingTenant(String),

    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Record tables missing: {0}")]
    SchemaMissing(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EstateError {
    /// Map to an HTTP status code for API responses.
    ///
    /// `SchemaMissing` is normally recovered before it reaches a handler;
    /// if it does escape it is reported as a server error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AccessDenied(_) => 403,
            Self::MissingTenant(_) => 401,
            Self::TenantNotFound(_) => 404,
            Self::SchemaMissing(_) | Self::Read(_) | Self::Config(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_is_distinct_from_data_errors() {
        assert_eq!(EstateError::AccessDenied("exceptions".into()).status_code(), 403);
        assert_eq!(EstateError::Read("connection reset".into()).status_code(), 500);
        assert_ne!(
            EstateError::AccessDenied("x".into()).status_code(),
            EstateError::Read("x".into()).status_code()
        );
    }
}
