use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::core::shared::schema::bia::{bia_processes, information_assets, organization_settings};
use crate::store::StoreError;

use super::classifier::{AssetRatings, SecurityLevel};
use super::criticality::{ImpactRatings, ImpactWeights, MAX_CRITICALITY};
use super::types::{BiaProcess, InformationAsset, OrganizationSettings};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = organization_settings)]
pub struct DbOrganizationSettings {
    pub id: Uuid,
    pub org_id: Uuid,
    pub weight_reputation: i32,
    pub weight_external: i32,
    pub weight_internal: i32,
    pub weight_legal: i32,
    pub weight_economic: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = bia_processes)]
pub struct DbBiaProcess {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub impact_reputation: i32,
    pub impact_external: i32,
    pub impact_internal: i32,
    pub impact_legal: i32,
    pub impact_economic: i32,
    pub criticality_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = information_assets)]
pub struct DbInformationAsset {
    pub id: Uuid,
    pub org_id: Uuid,
    pub process_id: Uuid,
    pub name: String,
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub c_rating: i32,
    pub i_rating: i32,
    pub a_rating: i32,
    pub security_level: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn corrupt(table: &str, id: Uuid, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{table} {id}: {detail}"))
}

pub fn db_settings_to_settings(db: DbOrganizationSettings) -> Result<OrganizationSettings, StoreError> {
    let weights = ImpactWeights::new(
        db.weight_reputation,
        db.weight_external,
        db.weight_internal,
        db.weight_legal,
        db.weight_economic,
    )
    .map_err(|e| corrupt("organization_settings", db.id, e))?;

    Ok(OrganizationSettings {
        id: db.id,
        organization_id: db.org_id,
        weights,
        updated_at: db.updated_at,
    })
}

pub fn settings_to_db(settings: &OrganizationSettings) -> DbOrganizationSettings {
    let w = &settings.weights;
    DbOrganizationSettings {
        id: settings.id,
        org_id: settings.organization_id,
        weight_reputation: i32::from(w.reputation),
        weight_external: i32::from(w.external),
        weight_internal: i32::from(w.internal),
        weight_legal: i32::from(w.legal),
        weight_economic: i32::from(w.economic),
        updated_at: settings.updated_at,
    }
}

pub fn db_process_to_process(db: DbBiaProcess) -> Result<BiaProcess, StoreError> {
    let impacts = ImpactRatings::new(
        db.impact_reputation,
        db.impact_external,
        db.impact_internal,
        db.impact_legal,
        db.impact_economic,
    )
    .map_err(|e| corrupt("bia_processes", db.id, e))?;
    let criticality_score = u8::try_from(db.criticality_score)
        .ok()
        .filter(|s| *s <= MAX_CRITICALITY)
        .ok_or_else(|| corrupt("bia_processes", db.id, "criticality_score out of range"))?;

    Ok(BiaProcess {
        id: db.id,
        organization_id: db.org_id,
        name: db.name,
        description: db.description,
        owner: db.owner,
        impacts,
        criticality_score,
        created_at: db.created_at,
        updated_at: db.updated_at,
    })
}

pub fn process_to_db(process: &BiaProcess) -> DbBiaProcess {
    let i = &process.impacts;
    DbBiaProcess {
        id: process.id,
        org_id: process.organization_id,
        name: process.name.clone(),
        description: process.description.clone(),
        owner: process.owner.clone(),
        impact_reputation: i32::from(i.reputation),
        impact_external: i32::from(i.external),
        impact_internal: i32::from(i.internal),
        impact_legal: i32::from(i.legal),
        impact_economic: i32::from(i.economic),
        criticality_score: i32::from(process.criticality_score),
        created_at: process.created_at,
        updated_at: process.updated_at,
    }
}

pub fn db_asset_to_asset(db: DbInformationAsset) -> Result<InformationAsset, StoreError> {
    let ratings = AssetRatings::new(db.c_rating, db.i_rating, db.a_rating)
        .map_err(|e| corrupt("information_assets", db.id, e))?;
    let security_level: SecurityLevel = db
        .security_level
        .parse()
        .map_err(|e: String| corrupt("information_assets", db.id, e))?;

    Ok(InformationAsset {
        id: db.id,
        organization_id: db.org_id,
        process_id: db.process_id,
        name: db.name,
        asset_type: db.asset_type,
        description: db.description,
        ratings,
        security_level,
        created_at: db.created_at,
        updated_at: db.updated_at,
    })
}

pub fn asset_to_db(asset: &InformationAsset) -> DbInformationAsset {
    DbInformationAsset {
        id: asset.id,
        org_id: asset.organization_id,
        process_id: asset.process_id,
        name: asset.name.clone(),
        asset_type: asset.asset_type.clone(),
        description: asset.description.clone(),
        c_rating: i32::from(asset.ratings.confidentiality()),
        i_rating: i32::from(asset.ratings.integrity()),
        a_rating: i32::from(asset.ratings.availability()),
        security_level: asset.security_level.to_string(),
        created_at: asset.created_at,
        updated_at: asset.updated_at,
    }
}
