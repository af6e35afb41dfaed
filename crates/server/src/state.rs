use std::sync::Arc;

use estate_core::Config;

use crate::store::EstateStore;

/// Shared, read-only application state. Nothing here changes per request.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn EstateStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn EstateStore>) -> Self {
        Self { config, store }
    }
}
