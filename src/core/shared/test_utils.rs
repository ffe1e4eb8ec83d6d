use chrono::Utc;
use uuid::Uuid;

use crate::catalog::{default_catalog, Control, ControlObjectives, ControlTypes, FrameworkMappings};
use crate::core::middleware::{TenantContext, UserRole};
use crate::evaluations::{Evaluation, EvaluationStatus};
use crate::history::ChangeHistoryEntry;
use crate::organizations::Organization;
use crate::store::{
    CatalogStore, Committed, ComplianceStore, InMemoryStore, Mutation, OrganizationStore,
    StoreError,
};

pub fn control(id: i32, control_code: &str, domain_code: &str, is_baseline: bool) -> Control {
    Control {
        id,
        control_code: control_code.to_string(),
        domain_code: domain_code.to_string(),
        domain: format!("{domain_code} domain"),
        domain_objective: None,
        section: None,
        control_statement: None,
        control_summary: Some(format!("{control_code} summary")),
        control_description: None,
        is_baseline,
        is_applicable: is_baseline,
        types: ControlTypes::default(),
        objectives: ControlObjectives::default(),
        mappings: FrameworkMappings::default(),
    }
}

pub fn evaluation(organization_id: Uuid, control_id: i32, status: EvaluationStatus) -> Evaluation {
    let mut evaluation = Evaluation::new(organization_id, control_id);
    evaluation.status = status;
    if status.is_evaluated() {
        evaluation.evaluated_at = Some(Utc::now());
    }
    evaluation
}

pub fn tenant(organization_id: Uuid, role: UserRole) -> TenantContext {
    TenantContext::new(organization_id, Uuid::new_v4(), role).with_name("Test User")
}

/// In-memory store holding the built-in catalog and one registered
/// organization.
pub fn seeded_store() -> (InMemoryStore, Uuid) {
    let store = InMemoryStore::new();
    store
        .seed_controls(default_catalog())
        .expect("seed catalog");
    let organization_id = Uuid::new_v4();
    store
        .save_organization(&Organization::new(organization_id, "Test Organization"))
        .expect("register organization");
    (store, organization_id)
}

pub fn history_entry(organization_id: Uuid, entity_type: &str) -> ChangeHistoryEntry {
    ChangeHistoryEntry {
        id: Uuid::new_v4(),
        organization_id,
        entity_type: entity_type.to_string(),
        entity_id: "fixture".to_string(),
        action: "create".to_string(),
        changes: serde_json::json!({}),
        user_id: None,
        user_name: None,
        created_at: Utc::now(),
    }
}

/// Writes a fixture row straight through the store.
pub fn commit(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    mutation: Mutation<'_>,
) -> Result<Committed, StoreError> {
    store.commit(mutation, &|_| history_entry(organization_id, "fixture"))
}
