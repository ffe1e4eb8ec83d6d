use axum::{extract::State, Json};
use log::info;
use std::sync::Arc;

use crate::core::middleware::{TenantContext, UserRole};
use crate::core::shared::state::AppState;
use crate::organizations::error::OrganizationsError;
use crate::organizations::types::{slugify, Organization, SaveOrganizationRequest};

pub async fn handle_get_my_organization(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
) -> Result<Json<Organization>, OrganizationsError> {
    let store = state.store.clone();

    let organization = tokio::task::spawn_blocking(move || {
        store.find_organization(tenant.organization_id)
    })
    .await
    .map_err(|e| OrganizationsError::Internal(e.to_string()))??
    .ok_or_else(|| OrganizationsError::NotFound("Organization not found".to_string()))?;

    Ok(Json(organization))
}

/// Registers the caller's organization on first use, renames it afterwards.
pub async fn handle_save_my_organization(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Json(req): Json<SaveOrganizationRequest>,
) -> Result<Json<Organization>, OrganizationsError> {
    tenant.require(UserRole::Admin)?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(OrganizationsError::Validation(
            "Organization name is required".to_string(),
        ));
    }
    let slug = req
        .slug
        .as_deref()
        .map(slugify)
        .unwrap_or_else(|| slugify(&name));
    if slug.is_empty() {
        return Err(OrganizationsError::Validation(
            "Organization slug must contain letters or digits".to_string(),
        ));
    }

    let store = state.store.clone();
    let organization_id = tenant.organization_id;

    let organization = tokio::task::spawn_blocking(move || {
        let mut organization = store
            .find_organization(organization_id)?
            .unwrap_or_else(|| Organization::new(organization_id, &name));
        organization.name = name;
        organization.slug = slug;
        store.save_organization(&organization)?;
        Ok::<_, OrganizationsError>(organization)
    })
    .await
    .map_err(|e| OrganizationsError::Internal(e.to_string()))??;

    info!("Saved organization {} ({})", organization.id, organization.slug);
    Ok(Json(organization))
}
