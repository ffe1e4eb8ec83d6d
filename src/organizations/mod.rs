pub mod error;
pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::state::AppState;
use crate::store::{ComplianceStore, StoreError};

pub use error::OrganizationsError;
pub use handlers::*;
pub use types::*;

/// Tenant writes need a registered organization row to hang off.
pub fn ensure_registered(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<Organization, StoreError> {
    store
        .find_organization(organization_id)?
        .ok_or_else(|| StoreError::NotFound("Organization".to_string()))
}

pub fn configure_organizations_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/organizations/me",
        get(handle_get_my_organization).put(handle_save_my_organization),
    )
}
