use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::store::ComplianceStore;

/// Shared by every handler through `State<Arc<AppState>>`.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn ComplianceStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ComplianceStore>) -> Self {
        Self { config, store }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
