use std::collections::{BTreeMap, HashMap};
use std::ops::Add;

use serde::{Deserialize, Serialize};

use super::score::{calculate_score, StatusColor};
use crate::bia::{ImpactWeights, TierResolution};
use crate::catalog::Control;
use crate::core::shared::utils::ratio_percent;
use crate::evaluations::{Evaluation, EvaluationStatus};

pub const CRITICAL_DOMAIN_LIMIT: usize = 5;

/// Per-organization inputs every scoring call depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoringContext {
    pub weights: ImpactWeights,
    pub tier: TierResolution,
}

impl ScoringContext {
    pub fn new(weights: ImpactWeights, tier: TierResolution) -> Self {
        Self { weights, tier }
    }

    pub fn multiplier(&self) -> usize {
        self.tier.additional_controls_per_domain
    }
}

/// Counts for one domain, or for the whole catalog once tallies are summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DomainTally {
    total: usize,
    baseline: usize,
    baseline_fully: usize,
    baseline_partial: usize,
    baseline_low: usize,
    additional_applicable: usize,
    additional_fully: usize,
    additional_partial: usize,
    additional_low: usize,
    fully: usize,
    partial: usize,
    low: usize,
    not_applied: usize,
    not_evaluated: usize,
    with_evidence: usize,
}

impl DomainTally {
    fn record(mut self, control: &Control, evaluation: Option<&Evaluation>) -> Self {
        let status = evaluation.map(|e| e.status).unwrap_or_default();
        self.total += 1;

        if control.is_baseline {
            self.baseline += 1;
            match status {
                EvaluationStatus::FullyApplied => self.baseline_fully += 1,
                EvaluationStatus::PartiallyApplied => self.baseline_partial += 1,
                EvaluationStatus::LowApplied => self.baseline_low += 1,
                _ => {}
            }
        } else if evaluation.is_some_and(Evaluation::effective_applicability) {
            self.additional_applicable += 1;
            match status {
                EvaluationStatus::FullyApplied => self.additional_fully += 1,
                EvaluationStatus::PartiallyApplied => self.additional_partial += 1,
                EvaluationStatus::LowApplied => self.additional_low += 1,
                _ => {}
            }
        }

        match status {
            EvaluationStatus::NotEvaluated => self.not_evaluated += 1,
            EvaluationStatus::FullyApplied => self.fully += 1,
            EvaluationStatus::PartiallyApplied => self.partial += 1,
            EvaluationStatus::LowApplied => self.low += 1,
            EvaluationStatus::NotApplied => self.not_applied += 1,
        }

        if status.is_evaluated() && evaluation.is_some_and(Evaluation::has_evidence) {
            self.with_evidence += 1;
        }

        self
    }

    fn evaluated(&self) -> usize {
        self.total - self.not_evaluated
    }

    fn applicable(&self) -> usize {
        self.baseline + self.additional_applicable
    }

    fn score_over(&self, effective_total: usize) -> f64 {
        calculate_score(self.fully, self.partial, self.low, effective_total)
    }
}

impl Add for DomainTally {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            baseline: self.baseline + other.baseline,
            baseline_fully: self.baseline_fully + other.baseline_fully,
            baseline_partial: self.baseline_partial + other.baseline_partial,
            baseline_low: self.baseline_low + other.baseline_low,
            additional_applicable: self.additional_applicable + other.additional_applicable,
            additional_fully: self.additional_fully + other.additional_fully,
            additional_partial: self.additional_partial + other.additional_partial,
            additional_low: self.additional_low + other.additional_low,
            fully: self.fully + other.fully,
            partial: self.partial + other.partial,
            low: self.low + other.low,
            not_applied: self.not_applied + other.not_applied,
            not_evaluated: self.not_evaluated + other.not_evaluated,
            with_evidence: self.with_evidence + other.with_evidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain_code: String,
    pub domain: String,
    pub domain_objective: Option<String>,
    pub total_controls: usize,
    pub baseline_controls: usize,
    pub applicable_controls: usize,
    pub fully_applied: usize,
    pub partially_applied: usize,
    pub low_applied: usize,
    pub not_applied: usize,
    pub not_evaluated: usize,
    pub baseline_fully_applied: usize,
    pub baseline_partially_applied: usize,
    pub baseline_low_applied: usize,
    pub additional_applicable: usize,
    pub additional_control_target: usize,
    pub additional_fully_applied: usize,
    pub additional_partially_applied: usize,
    pub additional_low_applied: usize,
    /// `baseline + max(additional_applicable, additional_control_target)`.
    pub effective_total: usize,
    pub score: f64,
    pub status: StatusColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalDomain {
    pub domain_code: String,
    pub domain: String,
    pub score: f64,
    pub fully_applied: usize,
    pub total_controls: usize,
}

impl From<&DomainScore> for CriticalDomain {
    fn from(score: &DomainScore) -> Self {
        Self {
            domain_code: score.domain_code.clone(),
            domain: score.domain.clone(),
            score: score.score,
            fully_applied: score.fully_applied,
            total_controls: score.total_controls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResult {
    pub overall_score: f64,
    pub baseline_score: f64,
    pub bia_level: String,
    pub bia_target: String,
    pub target_score: f64,
    pub is_bia_assessed: bool,

    pub total_controls: usize,
    pub baseline_controls: usize,
    pub applicable_controls: usize,
    pub evaluated_controls: usize,
    pub fully_applied: usize,
    pub partially_applied: usize,
    pub low_applied: usize,
    pub not_applied: usize,

    pub baseline_fully_applied: usize,
    pub baseline_partially_applied: usize,
    pub baseline_low_applied: usize,
    pub additional_applicable_controls: usize,
    pub additional_controls_required: usize,
    pub additional_fully_applied: usize,
    pub additional_partially_applied: usize,
    pub additional_low_applied: usize,

    pub controls_with_evidence: usize,
    pub evidence_coverage_percent: f64,

    /// Sorted by domain code.
    pub domain_scores: Vec<DomainScore>,
    pub critical_domains_count: usize,
    /// The lowest scoring red domains, worst first.
    pub critical_domains: Vec<CriticalDomain>,
}

impl DashboardResult {
    pub fn domain(&self, domain_code: &str) -> Option<&DomainScore> {
        self.domain_scores
            .iter()
            .find(|d| d.domain_code == domain_code)
    }
}

struct DomainGroup<'a> {
    domain: &'a str,
    domain_objective: Option<&'a str>,
    tally: DomainTally,
}

fn finish_domain(domain_code: &str, group: &DomainGroup<'_>, multiplier: usize) -> DomainScore {
    let tally = &group.tally;
    let effective_total = tally.baseline + tally.additional_applicable.max(multiplier);
    let score = tally.score_over(effective_total);

    DomainScore {
        domain_code: domain_code.to_string(),
        domain: group.domain.to_string(),
        domain_objective: group.domain_objective.map(str::to_string),
        total_controls: tally.total,
        baseline_controls: tally.baseline,
        applicable_controls: tally.applicable(),
        fully_applied: tally.fully,
        partially_applied: tally.partial,
        low_applied: tally.low,
        not_applied: tally.not_applied,
        not_evaluated: tally.not_evaluated,
        baseline_fully_applied: tally.baseline_fully,
        baseline_partially_applied: tally.baseline_partial,
        baseline_low_applied: tally.baseline_low,
        additional_applicable: tally.additional_applicable,
        additional_control_target: multiplier,
        additional_fully_applied: tally.additional_fully,
        additional_partially_applied: tally.additional_partial,
        additional_low_applied: tally.additional_low,
        effective_total,
        score,
        status: StatusColor::for_score(score),
    }
}

/// Scores one organization against the catalog.
///
/// Controls without an evaluation count as not evaluated. Each domain is
/// tallied on its own and the per-domain tallies are summed for the
/// organization-wide figures.
pub fn aggregate_dashboard(
    catalog: &[Control],
    evaluations: &HashMap<i32, Evaluation>,
    context: &ScoringContext,
) -> DashboardResult {
    let multiplier = context.multiplier();

    let mut groups: BTreeMap<&str, DomainGroup<'_>> = BTreeMap::new();
    for control in catalog {
        let group = groups
            .entry(control.domain_code.as_str())
            .or_insert_with(|| DomainGroup {
                domain: &control.domain,
                domain_objective: control.domain_objective.as_deref(),
                tally: DomainTally::default(),
            });
        group.tally = group.tally.record(control, evaluations.get(&control.id));
    }

    let domain_scores: Vec<DomainScore> = groups
        .iter()
        .map(|(code, group)| finish_domain(code, group, multiplier))
        .collect();

    let overall = groups
        .values()
        .fold(DomainTally::default(), |acc, group| acc + group.tally);

    let additional_controls_required = groups.len() * multiplier;
    let overall_effective_total =
        overall.baseline + overall.additional_applicable.max(additional_controls_required);
    let overall_score = overall.score_over(overall_effective_total);
    let baseline_score = calculate_score(
        overall.baseline_fully,
        overall.baseline_partial,
        overall.baseline_low,
        overall.baseline,
    );

    let mut critical: Vec<&DomainScore> = domain_scores
        .iter()
        .filter(|d| d.status == StatusColor::Red)
        .collect();
    critical.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.domain_code.cmp(&b.domain_code))
    });
    let critical_domains_count = critical.len();
    let critical_domains = critical
        .into_iter()
        .take(CRITICAL_DOMAIN_LIMIT)
        .map(CriticalDomain::from)
        .collect();

    let evaluated = overall.evaluated();

    DashboardResult {
        overall_score,
        baseline_score,
        bia_level: context.tier.tier.to_string(),
        bia_target: context.tier.target_label().to_string(),
        target_score: baseline_score,
        is_bia_assessed: context.tier.is_assessed,
        total_controls: overall.total,
        baseline_controls: overall.baseline,
        applicable_controls: overall.applicable(),
        evaluated_controls: evaluated,
        fully_applied: overall.fully,
        partially_applied: overall.partial,
        low_applied: overall.low,
        not_applied: overall.not_applied,
        baseline_fully_applied: overall.baseline_fully,
        baseline_partially_applied: overall.baseline_partial,
        baseline_low_applied: overall.baseline_low,
        additional_applicable_controls: overall.additional_applicable,
        additional_controls_required,
        additional_fully_applied: overall.additional_fully,
        additional_partially_applied: overall.additional_partial,
        additional_low_applied: overall.additional_low,
        controls_with_evidence: overall.with_evidence,
        evidence_coverage_percent: ratio_percent(overall.with_evidence as u64, evaluated as u64),
        domain_scores,
        critical_domains_count,
        critical_domains,
    }
}
