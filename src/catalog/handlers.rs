use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::catalog::error::CatalogError;
use crate::catalog::types::{
    Control, ControlCount, CountControlsQuery, DomainSummary, ListControlsQuery,
};
use crate::catalog::{filter_controls, summarize_domains};
use crate::core::middleware::TenantContext;
use crate::core::shared::state::AppState;

pub async fn handle_list_controls(
    State(state): State<Arc<AppState>>,
    _tenant: TenantContext,
    Query(query): Query<ListControlsQuery>,
) -> Result<Json<Vec<Control>>, CatalogError> {
    let store = state.store.clone();

    let catalog = tokio::task::spawn_blocking(move || store.list_controls())
        .await
        .map_err(|e| CatalogError::Internal(e.to_string()))??;

    Ok(Json(filter_controls(catalog, &query)))
}

pub async fn handle_count_controls(
    State(state): State<Arc<AppState>>,
    _tenant: TenantContext,
    Query(query): Query<CountControlsQuery>,
) -> Result<Json<ControlCount>, CatalogError> {
    let store = state.store.clone();

    let count = tokio::task::spawn_blocking(move || {
        store.count_controls(query.domain_code.as_deref(), query.is_baseline)
    })
    .await
    .map_err(|e| CatalogError::Internal(e.to_string()))??;

    Ok(Json(ControlCount { count }))
}

pub async fn handle_list_domains(
    State(state): State<Arc<AppState>>,
    _tenant: TenantContext,
) -> Result<Json<Vec<DomainSummary>>, CatalogError> {
    let store = state.store.clone();

    let catalog = tokio::task::spawn_blocking(move || store.list_controls())
        .await
        .map_err(|e| CatalogError::Internal(e.to_string()))??;

    Ok(Json(summarize_domains(&catalog)))
}

pub async fn handle_get_control(
    State(state): State<Arc<AppState>>,
    _tenant: TenantContext,
    Path(control_code): Path<String>,
) -> Result<Json<Control>, CatalogError> {
    let store = state.store.clone();
    let code = control_code.clone();

    let control = tokio::task::spawn_blocking(move || store.find_control_by_code(&code))
        .await
        .map_err(|e| CatalogError::Internal(e.to_string()))??
        .ok_or_else(|| CatalogError::NotFound(format!("Control {control_code} not found")))?;

    Ok(Json(control))
}
