use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::core::shared::schema::core::organizations;

use super::types::Organization;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = organizations)]
pub struct DbOrganization {
    pub org_id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

pub fn db_organization_to_organization(db: DbOrganization) -> Organization {
    Organization {
        id: db.org_id,
        name: db.name,
        slug: db.slug,
        created_at: db.created_at,
    }
}

pub fn organization_to_db(organization: &Organization) -> DbOrganization {
    DbOrganization {
        org_id: organization.id,
        name: organization.name.clone(),
        slug: organization.slug.clone(),
        created_at: organization.created_at,
    }
}
