use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::core::middleware::{TenantContext, UserRole};
use crate::history::{change_entry, ChangeAction, EntityType};
use crate::organizations::ensure_registered;
use crate::store::{Committed, ComplianceStore, Mutation, StoreError};

use super::classifier::AssetRatings;
use super::criticality::ImpactWeights;
use super::error::BiaError;
use super::tier::{resolve_tier, TierResolution};
use super::types::{
    BiaProcess, ComplianceLevelResponse, CreateAssetRequest, CreateProcessRequest,
    InformationAsset, ListAssetsQuery, OrganizationSettings, ProcessWithAssets, SettingsUpdate,
    UpdateAssetRequest, UpdateProcessRequest, UpdateSettingsRequest,
};

fn required_name(name: &str, what: &str) -> Result<String, BiaError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BiaError::Validation(format!("{what} name is required")));
    }
    Ok(name.to_string())
}

fn find_process(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    process_id: Uuid,
) -> Result<BiaProcess, BiaError> {
    store
        .find_process(organization_id, process_id)?
        .ok_or_else(|| BiaError::NotFound("Process not found".to_string()))
}

fn find_asset(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    asset_id: Uuid,
) -> Result<InformationAsset, BiaError> {
    store
        .find_asset(organization_id, asset_id)?
        .ok_or_else(|| BiaError::NotFound("Asset not found".to_string()))
}

fn committed_process(committed: Committed) -> Result<BiaProcess, BiaError> {
    match committed {
        Committed::Process(process) => Ok(process),
        other => Err(BiaError::Internal(format!(
            "process write returned {other:?}"
        ))),
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Settings are created with default weights on first read. Organizations
/// that are not registered yet get the defaults without a stored row.
pub fn load_settings(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<OrganizationSettings, StoreError> {
    if let Some(settings) = store.find_settings(organization_id)? {
        return Ok(settings);
    }
    let defaults = OrganizationSettings::with_defaults(organization_id);
    if store.find_organization(organization_id)?.is_none() {
        return Ok(defaults);
    }
    match store.insert_settings(&defaults) {
        Ok(()) => Ok(defaults),
        // Another request created the row first.
        Err(StoreError::Conflict(_)) => store
            .find_settings(organization_id)?
            .ok_or_else(|| StoreError::NotFound("Organization settings".to_string())),
        Err(e) => Err(e),
    }
}

pub fn get_settings(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<OrganizationSettings, BiaError> {
    Ok(load_settings(store, organization_id)?)
}

/// Changing any weight re-scores every process of the organization in the
/// same transaction, against the processes that exist at commit time.
pub fn update_settings(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    req: UpdateSettingsRequest,
) -> Result<SettingsUpdate, BiaError> {
    tenant.require(UserRole::Admin)?;
    // Unset weights fall back to stored values, which are always in range.
    req.apply_to(&ImpactWeights::default())?;
    ensure_registered(store, tenant.organization_id)?;

    let committed = store.commit(
        Mutation::UpdateWeights {
            organization_id: tenant.organization_id,
            update: &req,
        },
        &|committed| {
            let (entity_id, changes) = match committed {
                Committed::Weights {
                    previous,
                    settings,
                    processes_rescored,
                } => (
                    settings.id.to_string(),
                    serde_json::json!({
                        "old_weights": previous,
                        "new_weights": settings.weights,
                        "processes_rescored": processes_rescored,
                    }),
                ),
                _ => (tenant.organization_id.to_string(), serde_json::Value::Null),
            };
            change_entry(tenant, EntityType::Settings, entity_id, ChangeAction::Update, changes)
        },
    )?;
    let Committed::Weights {
        settings,
        processes_rescored,
        ..
    } = committed
    else {
        return Err(BiaError::Internal(
            "weight update returned no settings".to_string(),
        ));
    };

    info!(
        "BIA weights updated for organization {} ({} processes re-scored)",
        tenant.organization_id, processes_rescored
    );
    Ok(SettingsUpdate {
        settings,
        processes_rescored,
    })
}

// ============================================================================
// Processes
// ============================================================================

/// Highest criticality first, each with its assets.
pub fn list_processes(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<Vec<ProcessWithAssets>, BiaError> {
    let mut processes = store.list_processes(organization_id)?;
    processes.sort_by(|a, b| {
        b.criticality_score
            .cmp(&a.criticality_score)
            .then_with(|| a.name.cmp(&b.name))
    });
    let mut assets = store.list_assets(organization_id)?;

    Ok(processes
        .into_iter()
        .map(|process| {
            let (owned, rest): (Vec<_>, Vec<_>) =
                assets.drain(..).partition(|a| a.process_id == process.id);
            assets = rest;
            ProcessWithAssets {
                process,
                assets: owned,
            }
        })
        .collect())
}

pub fn create_process(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    req: CreateProcessRequest,
) -> Result<BiaProcess, BiaError> {
    tenant.require(UserRole::Admin)?;
    let name = required_name(&req.name, "Process")?;
    let impacts = req.impacts()?;
    ensure_registered(store, tenant.organization_id)?;

    let mut process = BiaProcess::new(tenant.organization_id, &name, impacts);
    process.description = req.description;
    process.owner = req.owner;
    let committed = store.commit(Mutation::InsertProcess(&process), &|committed| {
        let scored = committed.process().unwrap_or(&process);
        change_entry(
            tenant,
            EntityType::Process,
            scored.id,
            ChangeAction::Create,
            serde_json::json!({
                "name": scored.name,
                "criticality_score": scored.criticality_score,
            }),
        )
    })?;
    let process = committed_process(committed)?;

    info!(
        "BIA process {} created for organization {} (criticality {})",
        process.id, tenant.organization_id, process.criticality_score
    );
    Ok(process)
}

pub fn update_process(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    process_id: Uuid,
    req: UpdateProcessRequest,
) -> Result<BiaProcess, BiaError> {
    tenant.require(UserRole::Admin)?;
    let mut process = find_process(store, tenant.organization_id, process_id)?;
    let old_score = process.criticality_score;

    if let Some(name) = req.name.as_deref() {
        process.name = required_name(name, "Process")?;
    }
    if req.description.is_some() {
        process.description = req.description.clone();
    }
    if req.owner.is_some() {
        process.owner = req.owner.clone();
    }
    process.impacts = req.apply_to(&process.impacts)?;
    process.updated_at = Utc::now();

    let committed = store.commit(Mutation::UpdateProcess(&process), &|committed| {
        let scored = committed.process().unwrap_or(&process);
        change_entry(
            tenant,
            EntityType::Process,
            scored.id,
            ChangeAction::Update,
            serde_json::json!({
                "name": scored.name,
                "old_criticality_score": old_score,
                "new_criticality_score": scored.criticality_score,
            }),
        )
    })?;
    committed_process(committed)
}

/// Deleting a process deletes its assets too.
pub fn delete_process(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    process_id: Uuid,
) -> Result<(), BiaError> {
    tenant.require(UserRole::Admin)?;
    let process = find_process(store, tenant.organization_id, process_id)?;
    store.commit(
        Mutation::DeleteProcess {
            organization_id: tenant.organization_id,
            process_id,
        },
        &|_| {
            change_entry(
                tenant,
                EntityType::Process,
                process.id,
                ChangeAction::Delete,
                serde_json::json!({ "name": process.name }),
            )
        },
    )?;

    info!(
        "BIA process {} deleted from organization {}",
        process_id, tenant.organization_id
    );
    Ok(())
}

// ============================================================================
// Assets
// ============================================================================

pub fn list_assets(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    query: &ListAssetsQuery,
) -> Result<Vec<InformationAsset>, BiaError> {
    let mut assets: Vec<InformationAsset> = store
        .list_assets(organization_id)?
        .into_iter()
        .filter(|a| query.process_id.map_or(true, |p| a.process_id == p))
        .collect();
    assets.sort_by(|a, b| {
        b.security_level
            .cmp(&a.security_level)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(assets)
}

pub fn create_asset(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    req: CreateAssetRequest,
) -> Result<InformationAsset, BiaError> {
    tenant.require(UserRole::Admin)?;
    let name = required_name(&req.name, "Asset")?;
    let ratings = AssetRatings::new(req.c_rating, req.i_rating, req.a_rating)?;
    let process = find_process(store, tenant.organization_id, req.process_id)?;

    let mut asset = InformationAsset::new(tenant.organization_id, process.id, &name, ratings);
    asset.asset_type = req.asset_type;
    asset.description = req.description;
    store.commit(Mutation::InsertAsset(&asset), &|_| {
        change_entry(
            tenant,
            EntityType::Asset,
            asset.id,
            ChangeAction::Create,
            serde_json::json!({
                "name": asset.name,
                "process": process.name,
                "security_level": asset.security_level,
            }),
        )
    })?;

    info!(
        "Asset {} classified {} for organization {}",
        asset.id, asset.security_level, tenant.organization_id
    );
    Ok(asset)
}

pub fn update_asset(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    asset_id: Uuid,
    req: UpdateAssetRequest,
) -> Result<InformationAsset, BiaError> {
    tenant.require(UserRole::Admin)?;
    let mut asset = find_asset(store, tenant.organization_id, asset_id)?;
    let old_level = asset.security_level;

    if let Some(process_id) = req.process_id {
        asset.process_id = find_process(store, tenant.organization_id, process_id)?.id;
    }
    if let Some(name) = req.name.as_deref() {
        asset.name = required_name(name, "Asset")?;
    }
    if req.asset_type.is_some() {
        asset.asset_type = req.asset_type.clone();
    }
    if req.description.is_some() {
        asset.description = req.description.clone();
    }
    asset.ratings = req.apply_to(&asset.ratings)?;
    asset.security_level = asset.ratings.security_level();
    asset.updated_at = Utc::now();
    store.commit(Mutation::UpdateAsset(&asset), &|_| {
        change_entry(
            tenant,
            EntityType::Asset,
            asset.id,
            ChangeAction::Update,
            serde_json::json!({
                "name": asset.name,
                "old_security_level": old_level,
                "new_security_level": asset.security_level,
            }),
        )
    })?;
    Ok(asset)
}

pub fn delete_asset(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    asset_id: Uuid,
) -> Result<(), BiaError> {
    tenant.require(UserRole::Admin)?;
    let asset = find_asset(store, tenant.organization_id, asset_id)?;
    store.commit(
        Mutation::DeleteAsset {
            organization_id: tenant.organization_id,
            asset_id,
        },
        &|_| {
            change_entry(
                tenant,
                EntityType::Asset,
                asset.id,
                ChangeAction::Delete,
                serde_json::json!({ "name": asset.name }),
            )
        },
    )?;
    Ok(())
}

// ============================================================================
// Tier
// ============================================================================

pub fn resolve_for_organization(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<TierResolution, StoreError> {
    let levels = store
        .list_assets(organization_id)?
        .into_iter()
        .map(|a| a.security_level);
    let process_count = store.count_processes(organization_id)?;
    Ok(resolve_tier(levels, process_count))
}

pub fn compliance_level(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<ComplianceLevelResponse, BiaError> {
    let resolution = resolve_for_organization(store, organization_id)?;
    Ok(ComplianceLevelResponse {
        level: resolution.tier.to_string(),
        controls: resolution.controls_label().to_string(),
        is_assessed: resolution.is_assessed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bia::{BiaTier, SecurityLevel};
    use crate::core::shared::test_utils::{seeded_store, tenant};
    use crate::store::{BiaStore, HistoryStore};

    fn payroll() -> CreateProcessRequest {
        CreateProcessRequest {
            name: "Payroll".to_string(),
            description: None,
            owner: Some("Finance".to_string()),
            impact_reputation: 0,
            impact_external: 0,
            impact_internal: 0,
            impact_legal: 4,
            impact_economic: 0,
        }
    }

    fn asset_request(process_id: Uuid, c: i32, i: i32, a: i32) -> CreateAssetRequest {
        CreateAssetRequest {
            process_id,
            name: "Salary ledger".to_string(),
            asset_type: Some("database".to_string()),
            description: None,
            c_rating: c,
            i_rating: i,
            a_rating: a,
        }
    }

    #[test]
    fn test_settings_are_created_lazily() {
        let (store, org) = seeded_store();
        assert!(store.find_settings(org).unwrap().is_none());

        let settings = get_settings(&store, org).unwrap();
        assert_eq!(settings.weights.legal, 4);
        assert_eq!(store.find_settings(org).unwrap(), Some(settings.clone()));
        assert_eq!(get_settings(&store, org).unwrap().id, settings.id);
    }

    #[test]
    fn test_unregistered_organization_reads_defaults_without_storing() {
        let (store, _) = seeded_store();
        let stranger = Uuid::new_v4();
        let settings = get_settings(&store, stranger).unwrap();
        assert_eq!(settings.weights.reputation, 3);
        assert!(store.find_settings(stranger).unwrap().is_none());
    }

    #[test]
    fn test_weight_change_rescores_existing_processes() {
        let (store, org) = seeded_store();
        let admin = tenant(org, UserRole::Admin);

        let process = create_process(&store, &admin, payroll()).unwrap();
        assert_eq!(process.criticality_score, 20);

        let update = update_settings(
            &store,
            &admin,
            UpdateSettingsRequest {
                weight_legal: Some(1),
                ..UpdateSettingsRequest::default()
            },
        )
        .unwrap();
        assert_eq!(update.processes_rescored, 1);
        assert_eq!(update.settings.weights.legal, 1);

        let stored = store.find_process(org, process.id).unwrap().unwrap();
        assert_eq!(stored.criticality_score, 5);

        let history = store.list_history(org, Some("settings"), 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].changes["processes_rescored"], 1);
    }

    #[test]
    fn test_weight_change_skips_deleted_processes() {
        let (store, org) = seeded_store();
        let admin = tenant(org, UserRole::Admin);
        let kept = create_process(&store, &admin, payroll()).unwrap();
        let mut dropped_req = payroll();
        dropped_req.name = "Procurement".to_string();
        let dropped = create_process(&store, &admin, dropped_req).unwrap();
        delete_process(&store, &admin, dropped.id).unwrap();

        let update = update_settings(
            &store,
            &admin,
            UpdateSettingsRequest {
                weight_legal: Some(2),
                ..UpdateSettingsRequest::default()
            },
        )
        .unwrap();
        assert_eq!(update.processes_rescored, 1);
        assert!(store.find_process(org, dropped.id).unwrap().is_none());
        assert_eq!(store.list_processes(org).unwrap().len(), 1);
        // 4*2 * 1.25 = 10
        assert_eq!(
            store.find_process(org, kept.id).unwrap().unwrap().criticality_score,
            10
        );

        let later = create_process(&store, &admin, payroll()).unwrap();
        assert_eq!(later.criticality_score, 10);
    }

    #[test]
    fn test_settings_update_requires_admin_and_valid_weights() {
        let (store, org) = seeded_store();
        let err = update_settings(
            &store,
            &tenant(org, UserRole::Auditor),
            UpdateSettingsRequest::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BiaError::Forbidden(_)));

        let err = update_settings(
            &store,
            &tenant(org, UserRole::Admin),
            UpdateSettingsRequest {
                weight_economic: Some(5),
                ..UpdateSettingsRequest::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, BiaError::Validation(_)));
        assert_eq!(get_settings(&store, org).unwrap().weights.economic, 2);
    }

    #[test]
    fn test_process_validation() {
        let (store, org) = seeded_store();
        let admin = tenant(org, UserRole::Admin);

        let mut blank = payroll();
        blank.name = "   ".to_string();
        assert!(matches!(
            create_process(&store, &admin, blank).unwrap_err(),
            BiaError::Validation(_)
        ));

        let mut too_high = payroll();
        too_high.impact_reputation = 5;
        assert!(matches!(
            create_process(&store, &admin, too_high).unwrap_err(),
            BiaError::Validation(_)
        ));
    }

    #[test]
    fn test_update_process_rescores_with_current_weights() {
        let (store, org) = seeded_store();
        let admin = tenant(org, UserRole::Admin);
        let process = create_process(&store, &admin, payroll()).unwrap();

        let updated = update_process(
            &store,
            &admin,
            process.id,
            UpdateProcessRequest {
                impact_reputation: Some(4),
                ..UpdateProcessRequest::default()
            },
        )
        .unwrap();
        // (4*3 + 4*4) * 1.25 = 35
        assert_eq!(updated.criticality_score, 35);
        assert_eq!(updated.name, "Payroll");
        assert_eq!(updated.impacts.legal, 4);
    }

    #[test]
    fn test_processes_are_tenant_scoped() {
        let (store, org) = seeded_store();
        let process = create_process(&store, &tenant(org, UserRole::Admin), payroll()).unwrap();

        let outsider = tenant(Uuid::new_v4(), UserRole::Admin);
        let err = update_process(
            &store,
            &outsider,
            process.id,
            UpdateProcessRequest::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BiaError::NotFound(_)));
        assert!(list_processes(&store, outsider.organization_id)
            .unwrap()
            .is_empty());

        let err = create_asset(&store, &outsider, asset_request(process.id, 1, 1, 1)).unwrap_err();
        assert!(matches!(err, BiaError::NotFound(_)));
    }

    #[test]
    fn test_asset_lifecycle_drives_tier() {
        let (store, org) = seeded_store();
        let admin = tenant(org, UserRole::Admin);

        let unassessed = compliance_level(&store, org).unwrap();
        assert_eq!(unassessed.level, "Low");
        assert!(!unassessed.is_assessed);

        let process = create_process(&store, &admin, payroll()).unwrap();
        let asset = create_asset(&store, &admin, asset_request(process.id, 2, 1, 0)).unwrap();
        assert_eq!(asset.security_level, SecurityLevel::Medium);

        let level = compliance_level(&store, org).unwrap();
        assert_eq!(level.level, "Medium");
        assert_eq!(level.controls, "Baseline + 1+");
        assert!(level.is_assessed);

        let updated = update_asset(
            &store,
            &admin,
            asset.id,
            UpdateAssetRequest {
                a_rating: Some(3),
                ..UpdateAssetRequest::default()
            },
        )
        .unwrap();
        assert_eq!(updated.security_level, SecurityLevel::High);
        assert_eq!(
            resolve_for_organization(&store, org).unwrap().tier,
            BiaTier::High
        );

        let listed = list_processes(&store, org).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].assets.len(), 1);

        delete_process(&store, &admin, process.id).unwrap();
        assert!(store.find_asset(org, asset.id).unwrap().is_none());
        assert!(!compliance_level(&store, org).unwrap().is_assessed);
    }

    #[test]
    fn test_asset_ratings_are_validated() {
        let (store, org) = seeded_store();
        let admin = tenant(org, UserRole::Admin);
        let process = create_process(&store, &admin, payroll()).unwrap();

        assert!(create_asset(&store, &admin, asset_request(process.id, 4, 3, 3)).is_ok());
        let err = create_asset(&store, &admin, asset_request(process.id, 0, 4, 0)).unwrap_err();
        assert!(matches!(err, BiaError::Validation(_)));
    }

    #[test]
    fn test_list_assets_filters_by_process() {
        let (store, org) = seeded_store();
        let admin = tenant(org, UserRole::Admin);
        let first = create_process(&store, &admin, payroll()).unwrap();
        let mut second_req = payroll();
        second_req.name = "Procurement".to_string();
        let second = create_process(&store, &admin, second_req).unwrap();

        create_asset(&store, &admin, asset_request(first.id, 0, 0, 0)).unwrap();
        create_asset(&store, &admin, asset_request(second.id, 3, 0, 0)).unwrap();

        let all = list_assets(&store, org, &ListAssetsQuery::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].security_level, SecurityLevel::High);

        let query = ListAssetsQuery {
            process_id: Some(first.id),
        };
        let filtered = list_assets(&store, org, &query).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].process_id, first.id);
    }

    #[test]
    fn test_delete_asset() {
        let (store, org) = seeded_store();
        let admin = tenant(org, UserRole::Admin);
        let process = create_process(&store, &admin, payroll()).unwrap();
        let asset = create_asset(&store, &admin, asset_request(process.id, 1, 1, 1)).unwrap();

        delete_asset(&store, &admin, asset.id).unwrap();
        let err = delete_asset(&store, &admin, asset.id).unwrap_err();
        assert!(matches!(err, BiaError::NotFound(_)));
    }
}
