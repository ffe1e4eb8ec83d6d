pub mod error;
pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::TenantContext;
use crate::core::shared::state::AppState;

pub use error::HistoryError;
pub use handlers::*;
pub use types::*;

/// Builds the audit row for a tenant mutation. The store writes it in the
/// same transaction as the change.
pub fn change_entry(
    tenant: &TenantContext,
    entity_type: EntityType,
    entity_id: impl ToString,
    action: ChangeAction,
    changes: serde_json::Value,
) -> ChangeHistoryEntry {
    ChangeHistoryEntry {
        id: Uuid::new_v4(),
        organization_id: tenant.organization_id,
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        action: action.to_string(),
        changes,
        user_id: Some(tenant.user_id),
        user_name: tenant.user_name.clone(),
        created_at: Utc::now(),
    }
}

pub fn configure_history_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/history", get(handle_list_history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::middleware::UserRole;
    use crate::bia::{BiaProcess, ImpactRatings};
    use crate::core::shared::test_utils::{evaluation, seeded_store, tenant};
    use crate::evaluations::EvaluationStatus;
    use crate::store::{HistoryStore, Mutation};

    #[test]
    fn test_history_is_newest_first_and_filtered() {
        let (store, org) = seeded_store();
        let ctx = tenant(org, UserRole::Admin);
        let process = BiaProcess::new(org, "Payroll", ImpactRatings::default());
        let eval = evaluation(org, 1, EvaluationStatus::FullyApplied);

        store
            .commit(Mutation::InsertProcess(&process), &|_| {
                change_entry(
                    &ctx,
                    EntityType::Process,
                    process.id,
                    ChangeAction::Create,
                    serde_json::json!({ "name": "Payroll" }),
                )
            })
            .unwrap();
        store
            .commit(Mutation::SaveEvaluation(&eval), &|_| {
                change_entry(
                    &ctx,
                    EntityType::Evaluation,
                    "SG-01",
                    ChangeAction::Update,
                    serde_json::json!({ "status": "fully_applied" }),
                )
            })
            .unwrap();

        let all = store.list_history(org, None, 10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].entity_type, "evaluation");
        assert_eq!(all[0].user_name.as_deref(), Some("Test User"));
        assert_eq!(all[0].user_id, Some(ctx.user_id));

        let processes = store.list_history(org, Some("process"), 10).unwrap();
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].action, "create");
        assert_eq!(processes[0].entity_id, process.id.to_string());

        assert!(store.list_history(Uuid::new_v4(), None, 10).unwrap().is_empty());
        assert_eq!(store.list_history(org, None, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_limit_bounds() {
        let query = ListHistoryQuery {
            entity_type: None,
            limit: Some(0),
        };
        assert!(query.limit().is_err());
        let query = ListHistoryQuery {
            entity_type: None,
            limit: Some(501),
        };
        assert!(query.limit().is_err());
        assert_eq!(ListHistoryQuery::default().limit(), Ok(100));
    }
}
