//! Tenant identity and module gating, supplied by the upstream gateway as headers.

use axum::http::HeaderMap;
use uuid::Uuid;

use estate_core::EstateError;

pub const TENANT_HEADER: &str = "x-tenant-id";
/// Comma-separated feature modules enabled for the tenant.
pub const MODULES_HEADER: &str = "x-enabled-modules";

#[derive(Debug, Clone, PartialEq)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub enabled_modules: Vec<String>,
}

impl TenantContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, EstateError> {
        let raw = headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EstateError::MissingTenant(format!("{TENANT_HEADER} header is required")))?;

        let tenant_id = Uuid::parse_str(raw)
            .map_err(|_| EstateError::MissingTenant(format!("{TENANT_HEADER} is not a valid UUID")))?;

        let enabled_modules = headers
            .get(MODULES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(|m| m.trim().to_ascii_lowercase())
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            tenant_id,
            enabled_modules,
        })
    }

    /// `AccessDenied` unless `module` is enabled for this tenant.
    pub fn require_module(&self, module: &str) -> Result<(), EstateError> {
        let wanted = module.to_ascii_lowercase();
        if self.enabled_modules.iter().any(|m| *m == wanted) {
            Ok(())
        } else {
            Err(EstateError::AccessDenied(module.to_string()))
        }
    }
}
