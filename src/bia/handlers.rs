use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::bia::error::BiaError;
use crate::bia::service;
use crate::bia::types::{
    BiaProcess, ComplianceLevelResponse, CreateAssetRequest, CreateProcessRequest,
    InformationAsset, ListAssetsQuery, OrganizationSettings, ProcessWithAssets, SettingsUpdate,
    UpdateAssetRequest, UpdateProcessRequest, UpdateSettingsRequest,
};
use crate::core::middleware::TenantContext;
use crate::core::shared::state::AppState;

pub async fn handle_get_settings(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
) -> Result<Json<OrganizationSettings>, BiaError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::get_settings(store.as_ref(), tenant.organization_id)
    })
    .await
    .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_update_settings(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsUpdate>, BiaError> {
    let store = state.store.clone();

    let result =
        tokio::task::spawn_blocking(move || service::update_settings(store.as_ref(), &tenant, req))
            .await
            .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_list_processes(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
) -> Result<Json<Vec<ProcessWithAssets>>, BiaError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::list_processes(store.as_ref(), tenant.organization_id)
    })
    .await
    .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_create_process(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Json(req): Json<CreateProcessRequest>,
) -> Result<(StatusCode, Json<BiaProcess>), BiaError> {
    let store = state.store.clone();

    let result =
        tokio::task::spawn_blocking(move || service::create_process(store.as_ref(), &tenant, req))
            .await
            .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn handle_update_process(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(process_id): Path<Uuid>,
    Json(req): Json<UpdateProcessRequest>,
) -> Result<Json<BiaProcess>, BiaError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::update_process(store.as_ref(), &tenant, process_id, req)
    })
    .await
    .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_delete_process(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(process_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, BiaError> {
    let store = state.store.clone();

    tokio::task::spawn_blocking(move || {
        service::delete_process(store.as_ref(), &tenant, process_id)
    })
    .await
    .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(serde_json::json!({ "message": "Process deleted" })))
}

pub async fn handle_list_assets(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Query(query): Query<ListAssetsQuery>,
) -> Result<Json<Vec<InformationAsset>>, BiaError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::list_assets(store.as_ref(), tenant.organization_id, &query)
    })
    .await
    .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_create_asset(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Json(req): Json<CreateAssetRequest>,
) -> Result<(StatusCode, Json<InformationAsset>), BiaError> {
    let store = state.store.clone();

    let result =
        tokio::task::spawn_blocking(move || service::create_asset(store.as_ref(), &tenant, req))
            .await
            .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn handle_update_asset(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(asset_id): Path<Uuid>,
    Json(req): Json<UpdateAssetRequest>,
) -> Result<Json<InformationAsset>, BiaError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::update_asset(store.as_ref(), &tenant, asset_id, req)
    })
    .await
    .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_delete_asset(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, BiaError> {
    let store = state.store.clone();

    tokio::task::spawn_blocking(move || service::delete_asset(store.as_ref(), &tenant, asset_id))
        .await
        .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(serde_json::json!({ "message": "Asset deleted" })))
}

pub async fn handle_compliance_level(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
) -> Result<Json<ComplianceLevelResponse>, BiaError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::compliance_level(store.as_ref(), tenant.organization_id)
    })
    .await
    .map_err(|e| BiaError::Internal(e.to_string()))??;

    Ok(Json(result))
}
