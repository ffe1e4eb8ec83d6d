use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::core::middleware::TenantContext;
use crate::core::shared::state::AppState;
use crate::dashboard::error::DashboardError;
use crate::dashboard::service;
use crate::dashboard::types::DomainDetails;
use crate::scoring::{DashboardResult, PlatformStats};

pub async fn handle_dashboard_overview(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
) -> Result<Json<DashboardResult>, DashboardError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::overview(store.as_ref(), tenant.organization_id)
    })
    .await
    .map_err(|e| DashboardError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_domain_details(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(domain_code): Path<String>,
) -> Result<Json<DomainDetails>, DashboardError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::domain_details(store.as_ref(), tenant.organization_id, &domain_code)
    })
    .await
    .map_err(|e| DashboardError::Internal(e.to_string()))??;

    Ok(Json(result))
}

/// Unauthenticated.
pub async fn handle_public_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlatformStats>, DashboardError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || service::public_stats(store.as_ref()))
        .await
        .map_err(|e| DashboardError::Internal(e.to_string()))??;

    Ok(Json(result))
}
