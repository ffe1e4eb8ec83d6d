pub mod classifier;
pub mod criticality;
pub mod error;
pub mod handlers;
pub mod service;
pub mod storage;
pub mod tier;
pub mod types;

use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use classifier::{classify_asset, AssetRatings, SecurityLevel};
pub use criticality::{rescore_processes, score_process, ImpactRatings, ImpactWeights};
pub use error::BiaError;
pub use handlers::*;
pub use service::resolve_for_organization;
pub use tier::{resolve_tier, BiaTier, TierResolution};
pub use types::*;

pub fn configure_bia_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/bia/settings",
            get(handle_get_settings).put(handle_update_settings),
        )
        .route(
            "/api/bia/processes",
            get(handle_list_processes).post(handle_create_process),
        )
        .route(
            "/api/bia/processes/:process_id",
            put(handle_update_process).delete(handle_delete_process),
        )
        .route(
            "/api/bia/assets",
            get(handle_list_assets).post(handle_create_asset),
        )
        .route(
            "/api/bia/assets/:asset_id",
            put(handle_update_asset).delete(handle_delete_asset),
        )
        .route("/api/bia/compliance-level", get(handle_compliance_level))
}
