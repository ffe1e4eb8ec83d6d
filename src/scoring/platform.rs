use std::collections::{BTreeMap, HashMap, HashSet};

use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregator::{aggregate_dashboard, ScoringContext};
use crate::catalog::Control;
use crate::core::shared::utils::{ratio_percent, round_one_decimal};
use crate::evaluations::Evaluation;
use crate::store::StoreError;

/// Everything the platform rollup needs from one organization.
#[derive(Debug, Clone)]
pub struct OrganizationSnapshot {
    pub organization_id: Uuid,
    pub evaluations: HashMap<i32, Evaluation>,
    pub context: ScoringContext,
}

#[derive(Debug, thiserror::Error)]
#[error("organization {organization_id}: {source}")]
pub struct SnapshotError {
    pub organization_id: Uuid,
    #[source]
    pub source: StoreError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAverage {
    pub domain_code: String,
    pub domain: String,
    pub average_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_organizations: usize,
    pub organizations_scored: usize,
    pub organizations_skipped: usize,
    pub organizations_with_full_baseline: usize,
    pub organizations_with_additional_controls: usize,
    pub total_evaluations: usize,
    pub platform_evidence_coverage: f64,
    pub average_compliance_score: f64,
    pub domain_average_scores: Vec<DomainAverage>,
}

#[derive(Default)]
struct DomainAccumulator {
    sum: f64,
    contributors: usize,
}

/// Cross-organization rollup.
///
/// Organizations without evaluations are left out of every average. A
/// snapshot that failed to load is logged and counted as skipped; the
/// remaining organizations are still aggregated.
pub fn aggregate_platform<I>(catalog: &[Control], total_organizations: usize, snapshots: I) -> PlatformStats
where
    I: IntoIterator<Item = Result<OrganizationSnapshot, SnapshotError>>,
{
    if total_organizations == 0 {
        return PlatformStats::default();
    }

    let domain_of: HashMap<i32, &str> = catalog
        .iter()
        .map(|c| (c.id, c.domain_code.as_str()))
        .collect();

    let mut domains: BTreeMap<&str, (&str, DomainAccumulator)> = BTreeMap::new();
    for control in catalog {
        domains
            .entry(control.domain_code.as_str())
            .or_insert_with(|| (control.domain.as_str(), DomainAccumulator::default()));
    }

    let mut stats = PlatformStats {
        total_organizations,
        ..PlatformStats::default()
    };
    let mut score_sum = 0.0;
    let mut evaluations_with_evidence = 0usize;

    for snapshot in snapshots {
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping {} in platform statistics", e);
                stats.organizations_skipped += 1;
                continue;
            }
        };
        if snapshot.evaluations.is_empty() {
            continue;
        }

        let result = aggregate_dashboard(catalog, &snapshot.evaluations, &snapshot.context);

        stats.organizations_scored += 1;
        score_sum += result.overall_score;

        if result.baseline_controls > 0 && result.baseline_fully_applied == result.baseline_controls {
            stats.organizations_with_full_baseline += 1;
        }
        if result.additional_applicable_controls > 0 {
            stats.organizations_with_additional_controls += 1;
        }

        stats.total_evaluations += snapshot.evaluations.len();
        evaluations_with_evidence += snapshot
            .evaluations
            .values()
            .filter(|e| e.has_evidence())
            .count();

        let evaluated_domains: HashSet<&str> = snapshot
            .evaluations
            .keys()
            .filter_map(|control_id| domain_of.get(control_id).copied())
            .collect();
        for domain_score in &result.domain_scores {
            if !evaluated_domains.contains(domain_score.domain_code.as_str()) {
                continue;
            }
            if let Some((_, acc)) = domains.get_mut(domain_score.domain_code.as_str()) {
                acc.sum += domain_score.score;
                acc.contributors += 1;
            }
        }
    }

    if stats.organizations_scored > 0 {
        stats.average_compliance_score =
            round_one_decimal(score_sum / stats.organizations_scored as f64);
    }
    stats.platform_evidence_coverage =
        ratio_percent(evaluations_with_evidence as u64, stats.total_evaluations as u64);
    stats.domain_average_scores = domains
        .into_iter()
        .map(|(code, (domain, acc))| DomainAverage {
            domain_code: code.to_string(),
            domain: domain.to_string(),
            average_score: if acc.contributors == 0 {
                0.0
            } else {
                round_one_decimal(acc.sum / acc.contributors as f64)
            },
        })
        .collect();

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bia::{BiaTier, ImpactWeights, TierResolution};
    use crate::core::shared::test_utils::{control, evaluation};
    use crate::evaluations::EvaluationStatus;

    fn catalog() -> Vec<Control> {
        vec![
            control(1, "SG-01", "SG", true),
            control(2, "SG-02", "SG", false),
            control(3, "AM-01", "AM", true),
        ]
    }

    fn snapshot(items: Vec<Evaluation>) -> Result<OrganizationSnapshot, SnapshotError> {
        let organization_id = items
            .first()
            .map(|e| e.organization_id)
            .unwrap_or_else(Uuid::new_v4);
        Ok(OrganizationSnapshot {
            organization_id,
            evaluations: items.into_iter().map(|e| (e.control_id, e)).collect(),
            context: ScoringContext::new(
                ImpactWeights::default(),
                TierResolution::new(BiaTier::Low, true),
            ),
        })
    }

    #[test]
    fn test_zero_organizations_short_circuit() {
        let stats = aggregate_platform(&catalog(), 0, Vec::new());
        assert_eq!(stats, PlatformStats::default());
    }

    #[test]
    fn test_rollup_over_scored_organizations() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut evidenced = evaluation(a, 1, EvaluationStatus::FullyApplied);
        evidenced.evidence_count = 1;

        let stats = aggregate_platform(
            &catalog(),
            3,
            vec![
                snapshot(vec![
                    evidenced,
                    evaluation(a, 2, EvaluationStatus::PartiallyApplied),
                    evaluation(a, 3, EvaluationStatus::FullyApplied),
                ]),
                snapshot(vec![evaluation(b, 1, EvaluationStatus::NotApplied)]),
                snapshot(Vec::new()),
            ],
        );

        assert_eq!(stats.total_organizations, 3);
        assert_eq!(stats.organizations_scored, 2);
        assert_eq!(stats.organizations_skipped, 0);
        assert_eq!(stats.organizations_with_full_baseline, 1);
        assert_eq!(stats.organizations_with_additional_controls, 1);
        assert_eq!(stats.total_evaluations, 4);
        assert_eq!(stats.platform_evidence_coverage, 25.0);
        // org a: 2.5 / 3 = 83.3, org b: 0.0, mean 41.65 ties to 41.6
        assert_eq!(stats.average_compliance_score, 41.6);

        let sg = &stats.domain_average_scores[1];
        assert_eq!(sg.domain_code, "SG");
        // org a SG: 1.5 / 2 = 75.0, org b SG: 0.0
        assert_eq!(sg.average_score, 37.5);
        let am = &stats.domain_average_scores[0];
        assert_eq!(am.domain_code, "AM");
        // only org a evaluated AM
        assert_eq!(am.average_score, 100.0);
    }

    #[test]
    fn test_failed_organization_is_skipped() {
        let a = Uuid::new_v4();
        let stats = aggregate_platform(
            &catalog(),
            2,
            vec![
                Err(SnapshotError {
                    organization_id: Uuid::new_v4(),
                    source: StoreError::Connection("pool timed out".to_string()),
                }),
                snapshot(vec![evaluation(a, 1, EvaluationStatus::FullyApplied)]),
            ],
        );

        assert_eq!(stats.organizations_skipped, 1);
        assert_eq!(stats.organizations_scored, 1);
        // baseline 2 controls, one fully applied
        assert_eq!(stats.average_compliance_score, 50.0);
    }

    #[test]
    fn test_domain_without_contributors_averages_zero() {
        let a = Uuid::new_v4();
        let stats = aggregate_platform(
            &catalog(),
            1,
            vec![snapshot(vec![evaluation(a, 3, EvaluationStatus::FullyApplied)])],
        );
        let sg = stats
            .domain_average_scores
            .iter()
            .find(|d| d.domain_code == "SG")
            .unwrap();
        assert_eq!(sg.average_score, 0.0);
    }
}
