pub mod error;
pub mod handlers;
pub mod service;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use error::DashboardError;
pub use handlers::*;
pub use types::*;

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard/overview", get(handle_dashboard_overview))
        .route(
            "/api/dashboard/domain/:domain_code",
            get(handle_domain_details),
        )
        .route("/api/dashboard/public", get(handle_public_stats))
}
