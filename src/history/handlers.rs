use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::middleware::TenantContext;
use crate::core::shared::state::AppState;
use crate::history::error::HistoryError;
use crate::history::types::{ChangeHistoryEntry, ListHistoryQuery};

pub async fn handle_list_history(
    State(state): State<Arc<AppState>>,
    tenant: TenantContext,
    Query(query): Query<ListHistoryQuery>,
) -> Result<Json<Vec<ChangeHistoryEntry>>, HistoryError> {
    let limit = query.limit().map_err(HistoryError::Validation)?;
    let store = state.store.clone();

    let entries = tokio::task::spawn_blocking(move || {
        store.list_history(tenant.organization_id, query.entity_type.as_deref(), limit)
    })
    .await
    .map_err(|e| HistoryError::Internal(e.to_string()))??;

    Ok(Json(entries))
}
