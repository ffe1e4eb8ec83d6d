use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::core::shared::schema::core::change_history;

use super::types::ChangeHistoryEntry;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = change_history)]
pub struct DbChangeHistory {
    pub id: Uuid,
    pub org_id: Uuid,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub changes: serde_json::Value,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub fn db_history_to_entry(db: DbChangeHistory) -> ChangeHistoryEntry {
    ChangeHistoryEntry {
        id: db.id,
        organization_id: db.org_id,
        entity_type: db.entity_type,
        entity_id: db.entity_id,
        action: db.action,
        changes: db.changes,
        user_id: db.user_id,
        user_name: db.user_name,
        created_at: db.created_at,
    }
}

pub fn entry_to_db_history(entry: &ChangeHistoryEntry) -> DbChangeHistory {
    DbChangeHistory {
        id: entry.id,
        org_id: entry.organization_id,
        entity_type: entry.entity_type.clone(),
        entity_id: entry.entity_id.clone(),
        action: entry.action.clone(),
        changes: entry.changes.clone(),
        user_id: entry.user_id,
        user_name: entry.user_name.clone(),
        created_at: entry.created_at,
    }
}
