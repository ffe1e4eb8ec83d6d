use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::TenantContext;
use crate::core::shared::state::AppState;
use crate::evaluations::error::EvaluationsError;
use crate::evaluations::service;
use crate::evaluations::types::{
    Comment, CreateCommentRequest, Evaluation, EvaluationWithControl, Evidence,
    ListEvaluationsQuery, RegisterEvidenceRequest, UpdateEvaluationRequest,
};

pub async fn handle_list_evaluations(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Query(query): Query<ListEvaluationsQuery>,
) -> Result<Json<Vec<EvaluationWithControl>>, EvaluationsError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::list_evaluations(store.as_ref(), tenant.organization_id, &query)
    })
    .await
    .map_err(|e| EvaluationsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_get_evaluation(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(control_code): Path<String>,
) -> Result<Json<EvaluationWithControl>, EvaluationsError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::get_evaluation(store.as_ref(), tenant.organization_id, &control_code)
    })
    .await
    .map_err(|e| EvaluationsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_update_evaluation(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(control_code): Path<String>,
    Json(req): Json<UpdateEvaluationRequest>,
) -> Result<Json<Evaluation>, EvaluationsError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::update_evaluation(store.as_ref(), &tenant, &control_code, req)
    })
    .await
    .map_err(|e| EvaluationsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_list_evidence(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(control_code): Path<String>,
) -> Result<Json<Vec<Evidence>>, EvaluationsError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::list_evidence(store.as_ref(), tenant.organization_id, &control_code)
    })
    .await
    .map_err(|e| EvaluationsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_register_evidence(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(control_code): Path<String>,
    Json(req): Json<RegisterEvidenceRequest>,
) -> Result<(StatusCode, Json<Evidence>), EvaluationsError> {
    let store = state.store.clone();
    let uploads = state.config.uploads.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::register_evidence(store.as_ref(), &tenant, &uploads, &control_code, req)
    })
    .await
    .map_err(|e| EvaluationsError::Internal(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn handle_delete_evidence(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path((control_code, evidence_id)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>, EvaluationsError> {
    let store = state.store.clone();

    tokio::task::spawn_blocking(move || {
        service::delete_evidence(store.as_ref(), &tenant, &control_code, evidence_id)
    })
    .await
    .map_err(|e| EvaluationsError::Internal(e.to_string()))??;

    Ok(Json(serde_json::json!({ "message": "Evidence deleted" })))
}

pub async fn handle_list_comments(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(control_code): Path<String>,
) -> Result<Json<Vec<Comment>>, EvaluationsError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::list_comments(store.as_ref(), tenant.organization_id, &control_code)
    })
    .await
    .map_err(|e| EvaluationsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_add_comment(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Path(control_code): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), EvaluationsError> {
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || {
        service::add_comment(store.as_ref(), &tenant, &control_code, req)
    })
    .await
    .map_err(|e| EvaluationsError::Internal(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(result)))
}
