use std::collections::HashMap;
use uuid::Uuid;

use crate::bia::resolve_for_organization;
use crate::catalog::Control;
use crate::evaluations::Evaluation;
use crate::scoring::{
    aggregate_dashboard, aggregate_platform, DashboardResult, OrganizationSnapshot,
    PlatformStats, ScoringContext, SnapshotError,
};
use crate::store::{ComplianceStore, StoreError};

use super::error::DashboardError;
use super::types::{DomainControlDetail, DomainDetails};

/// Read-only: organizations without stored settings score with the
/// default weights.
pub fn scoring_context(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<ScoringContext, StoreError> {
    let weights = store
        .find_settings(organization_id)?
        .map(|s| s.weights)
        .unwrap_or_default();
    let tier = resolve_for_organization(store, organization_id)?;
    Ok(ScoringContext::new(weights, tier))
}

fn evaluations_by_control(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<HashMap<i32, Evaluation>, StoreError> {
    Ok(store
        .list_evaluations(organization_id)?
        .into_iter()
        .map(|e| (e.control_id, e))
        .collect())
}

/// Recomputed from scratch on every read.
pub fn overview(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<DashboardResult, DashboardError> {
    let catalog = store.list_controls()?;
    let evaluations = evaluations_by_control(store, organization_id)?;
    let context = scoring_context(store, organization_id)?;
    Ok(aggregate_dashboard(&catalog, &evaluations, &context))
}

pub fn domain_details(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    domain_code: &str,
) -> Result<DomainDetails, DashboardError> {
    let mut controls: Vec<Control> = store
        .list_controls()?
        .into_iter()
        .filter(|c| c.domain_code == domain_code)
        .collect();
    let Some(first) = controls.first() else {
        return Err(DashboardError::NotFound(format!(
            "Domain {domain_code} not found"
        )));
    };
    let domain = first.domain.clone();
    let domain_objective = first.domain_objective.clone();
    controls.sort_by(|a, b| a.control_code.cmp(&b.control_code));

    let evaluations = evaluations_by_control(store, organization_id)?;
    let controls = controls
        .into_iter()
        .map(|control| {
            let evaluation = evaluations.get(&control.id);
            DomainControlDetail {
                is_applicable: evaluation
                    .and_then(|e| e.is_applicable)
                    .unwrap_or(control.is_applicable),
                status: evaluation.map(|e| e.status).unwrap_or_default(),
                feedback: evaluation.and_then(|e| e.feedback.clone()),
                control_code: control.control_code,
                control_summary: control.control_summary,
                is_baseline: control.is_baseline,
            }
        })
        .collect();

    Ok(DomainDetails {
        domain_code: domain_code.to_string(),
        domain,
        domain_objective,
        controls,
    })
}

fn snapshot(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
) -> Result<OrganizationSnapshot, StoreError> {
    Ok(OrganizationSnapshot {
        organization_id,
        evaluations: evaluations_by_control(store, organization_id)?,
        context: scoring_context(store, organization_id)?,
    })
}

/// Anonymous platform-wide figures. Organizations whose data cannot be
/// loaded are skipped rather than failing the whole report.
pub fn public_stats(store: &dyn ComplianceStore) -> Result<PlatformStats, DashboardError> {
    let catalog = store.list_controls()?;
    let organizations = store.list_organizations()?;

    let snapshots = organizations.iter().map(|organization| {
        snapshot(store, organization.id).map_err(|source| SnapshotError {
            organization_id: organization.id,
            source,
        })
    });
    Ok(aggregate_platform(&catalog, organizations.len(), snapshots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bia::service::{create_asset, create_process};
    use crate::bia::{CreateAssetRequest, CreateProcessRequest};
    use crate::core::middleware::UserRole;
    use crate::core::shared::test_utils::{seeded_store, tenant};
    use crate::evaluations::service::update_evaluation;
    use crate::evaluations::{EvaluationStatus, UpdateEvaluationRequest};
    use crate::organizations::Organization;
    use crate::scoring::StatusColor;
    use crate::store::{BiaStore, CatalogStore, OrganizationStore};

    fn evaluate(
        store: &dyn ComplianceStore,
        organization_id: Uuid,
        control_code: &str,
        status: EvaluationStatus,
    ) {
        update_evaluation(
            store,
            &tenant(organization_id, UserRole::Auditor),
            control_code,
            UpdateEvaluationRequest {
                status,
                feedback: None,
                is_applicable: None,
            },
        )
        .unwrap();
    }

    fn add_high_asset(store: &dyn ComplianceStore, organization_id: Uuid) {
        let admin = tenant(organization_id, UserRole::Admin);
        let process = create_process(
            store,
            &admin,
            CreateProcessRequest {
                name: "Clearing".to_string(),
                description: None,
                owner: None,
                impact_reputation: 3,
                impact_external: 3,
                impact_internal: 2,
                impact_legal: 4,
                impact_economic: 4,
            },
        )
        .unwrap();
        create_asset(
            store,
            &admin,
            CreateAssetRequest {
                process_id: process.id,
                name: "Settlement ledger".to_string(),
                asset_type: None,
                description: None,
                c_rating: 4,
                i_rating: 3,
                a_rating: 3,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_overview_follows_bia_tier() {
        let (store, org) = seeded_store();
        evaluate(&store, org, "SG-01", EvaluationStatus::FullyApplied);
        evaluate(&store, org, "SG-02", EvaluationStatus::FullyApplied);

        let unassessed = overview(&store, org).unwrap();
        assert!(!unassessed.is_bia_assessed);
        assert_eq!(unassessed.bia_level, "Low");
        // 2 of 7 baseline controls
        assert_eq!(unassessed.overall_score, 28.6);
        assert_eq!(unassessed.domain("SG").unwrap().score, 66.7);

        add_high_asset(&store, org);
        let high = overview(&store, org).unwrap();
        assert!(high.is_bia_assessed);
        assert_eq!(high.bia_level, "High");
        // 7 baseline + 3 domains * 2 additional
        assert_eq!(high.overall_score, 15.4);
        let sg = high.domain("SG").unwrap();
        assert_eq!(sg.effective_total, 5);
        assert_eq!(sg.score, 40.0);
        assert_eq!(sg.status, StatusColor::Red);
        assert_eq!(high.baseline_score, unassessed.baseline_score);
    }

    #[test]
    fn test_domain_details_use_evaluation_override() {
        let (store, org) = seeded_store();
        evaluate(&store, org, "SG-04", EvaluationStatus::PartiallyApplied);

        let details = domain_details(&store, org, "SG").unwrap();
        assert_eq!(details.controls.len(), 4);
        assert_eq!(details.controls[0].control_code, "SG-01");
        assert!(details.controls[0].is_applicable);
        assert_eq!(details.controls[0].status, EvaluationStatus::NotEvaluated);

        let sg04 = &details.controls[3];
        assert!(!sg04.is_baseline);
        assert!(sg04.is_applicable);
        assert_eq!(sg04.status, EvaluationStatus::PartiallyApplied);

        let other = domain_details(&store, Uuid::new_v4(), "SG").unwrap();
        assert!(!other.controls[3].is_applicable);
    }

    #[test]
    fn test_unknown_domain_is_not_found() {
        let (store, org) = seeded_store();
        let err = domain_details(&store, org, "ZZ").unwrap_err();
        assert!(matches!(err, DashboardError::NotFound(_)));
    }

    #[test]
    fn test_public_stats_skip_organizations_without_evaluations() {
        let (store, org) = seeded_store();
        let idle = Uuid::new_v4();
        store
            .save_organization(&Organization::new(idle, "Idle Authority"))
            .unwrap();
        evaluate(&store, org, "SG-01", EvaluationStatus::FullyApplied);
        evaluate(&store, org, "AM-04", EvaluationStatus::LowApplied);

        let stats = public_stats(&store).unwrap();
        assert_eq!(stats.total_organizations, 2);
        assert_eq!(stats.organizations_scored, 1);
        assert_eq!(stats.organizations_skipped, 0);
        assert_eq!(stats.total_evaluations, 2);
        assert_eq!(stats.organizations_with_additional_controls, 1);
        assert_eq!(stats.organizations_with_full_baseline, 0);
        assert_eq!(
            stats.average_compliance_score,
            overview(&store, org).unwrap().overall_score
        );

        let ra = stats
            .domain_average_scores
            .iter()
            .find(|d| d.domain_code == "RA")
            .unwrap();
        assert_eq!(ra.average_score, 0.0);
    }

    #[test]
    fn test_dashboard_reads_do_not_create_settings() {
        let (store, org) = seeded_store();
        evaluate(&store, org, "SG-01", EvaluationStatus::FullyApplied);

        overview(&store, org).unwrap();
        public_stats(&store).unwrap();
        assert!(store.find_settings(org).unwrap().is_none());
    }

    #[test]
    fn test_public_stats_without_organizations() {
        let store = crate::store::InMemoryStore::new();
        store
            .seed_controls(crate::catalog::default_catalog())
            .unwrap();
        assert_eq!(public_stats(&store).unwrap(), PlatformStats::default());
    }
}
