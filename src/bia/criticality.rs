use serde::{Deserialize, Serialize};

use super::types::{check_range, BiaProcess, RatingError};

pub const MAX_IMPACT: i32 = 4;
pub const MIN_WEIGHT: i32 = 1;
pub const MAX_WEIGHT: i32 = 4;
pub const MAX_CRITICALITY: u8 = 100;

/// Impact ratings (0-4) of a business process on the five BIA dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImpactRatings {
    pub reputation: u8,
    pub external: u8,
    pub internal: u8,
    pub legal: u8,
    pub economic: u8,
}

impl ImpactRatings {
    pub fn new(
        reputation: i32,
        external: i32,
        internal: i32,
        legal: i32,
        economic: i32,
    ) -> Result<Self, RatingError> {
        Ok(Self {
            reputation: check_range("impact_reputation", reputation, 0, MAX_IMPACT)?,
            external: check_range("impact_external", external, 0, MAX_IMPACT)?,
            internal: check_range("impact_internal", internal, 0, MAX_IMPACT)?,
            legal: check_range("impact_legal", legal, 0, MAX_IMPACT)?,
            economic: check_range("impact_economic", economic, 0, MAX_IMPACT)?,
        })
    }

    fn as_array(&self) -> [u8; 5] {
        [
            self.reputation,
            self.external,
            self.internal,
            self.legal,
            self.economic,
        ]
    }
}

/// Per-organization weights (1-4) for each impact dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactWeights {
    pub reputation: u8,
    pub external: u8,
    pub internal: u8,
    pub legal: u8,
    pub economic: u8,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            reputation: 3,
            external: 3,
            internal: 2,
            legal: 4,
            economic: 2,
        }
    }
}

impl ImpactWeights {
    pub fn new(
        reputation: i32,
        external: i32,
        internal: i32,
        legal: i32,
        economic: i32,
    ) -> Result<Self, RatingError> {
        Ok(Self {
            reputation: check_range("weight_reputation", reputation, MIN_WEIGHT, MAX_WEIGHT)?,
            external: check_range("weight_external", external, MIN_WEIGHT, MAX_WEIGHT)?,
            internal: check_range("weight_internal", internal, MIN_WEIGHT, MAX_WEIGHT)?,
            legal: check_range("weight_legal", legal, MIN_WEIGHT, MAX_WEIGHT)?,
            economic: check_range("weight_economic", economic, MIN_WEIGHT, MAX_WEIGHT)?,
        })
    }

    fn as_array(&self) -> [u8; 5] {
        [
            self.reputation,
            self.external,
            self.internal,
            self.legal,
            self.economic,
        ]
    }
}

/// `floor(1.25 * Σ impact_i * weight_i)` clamped to [0, 100].
///
/// The weighted sum is an integer, so `1.25 * sum` floors to `sum * 5 / 4`
/// under integer division. With impacts and weights at their maxima the sum
/// is 80 and the score lands exactly on 100.
pub fn score_process(impacts: &ImpactRatings, weights: &ImpactWeights) -> u8 {
    let weighted_sum: u32 = impacts
        .as_array()
        .iter()
        .zip(weights.as_array().iter())
        .map(|(impact, weight)| u32::from(*impact) * u32::from(*weight))
        .sum();

    let scaled = weighted_sum * 5 / 4;
    scaled.min(u32::from(MAX_CRITICALITY)) as u8
}

/// Re-scores every process against `weights`, returning how many scores
/// changed.
pub fn rescore_processes(processes: &mut [BiaProcess], weights: &ImpactWeights) -> usize {
    processes
        .iter_mut()
        .map(|process| {
            let score = score_process(&process.impacts, weights);
            let changed = process.criticality_score != score;
            process.criticality_score = score;
            changed
        })
        .filter(|changed| *changed)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_impacts(value: i32) -> ImpactRatings {
        ImpactRatings::new(value, value, value, value, value).unwrap()
    }

    fn uniform_weights(value: i32) -> ImpactWeights {
        ImpactWeights::new(value, value, value, value, value).unwrap()
    }

    #[test]
    fn test_ceiling_reached_only_at_extremity() {
        assert_eq!(score_process(&uniform_impacts(4), &uniform_weights(4)), 100);

        let almost = ImpactRatings::new(4, 4, 4, 4, 3).unwrap();
        assert!(score_process(&almost, &uniform_weights(4)) < 100);
    }

    #[test]
    fn test_zero_impacts_score_zero() {
        assert_eq!(score_process(&uniform_impacts(0), &uniform_weights(4)), 0);
        assert_eq!(
            score_process(&uniform_impacts(0), &ImpactWeights::default()),
            0
        );
    }

    #[test]
    fn test_fractional_results_are_truncated() {
        // sum = 1*3 = 3, 1.25 * 3 = 3.75
        let impacts = ImpactRatings::new(1, 0, 0, 0, 0).unwrap();
        assert_eq!(score_process(&impacts, &uniform_weights(3)), 3);

        // sum = 2*3 + 1*3 + 1*2 + 2*4 + 0*2 = 19, 1.25 * 19 = 23.75
        let impacts = ImpactRatings::new(2, 1, 1, 2, 0).unwrap();
        assert_eq!(score_process(&impacts, &ImpactWeights::default()), 23);
    }

    #[test]
    fn test_weights_reject_out_of_range() {
        assert!(ImpactWeights::new(0, 1, 1, 1, 1).is_err());
        assert!(ImpactWeights::new(1, 1, 1, 5, 1).is_err());
        assert!(ImpactRatings::new(0, 0, 0, 0, 5).is_err());
    }

    #[test]
    fn test_rescore_counts_changed_processes() {
        let org = uuid::Uuid::new_v4();
        let mut processes = vec![
            BiaProcess::new(org, "Payroll", ImpactRatings::new(0, 0, 0, 4, 0).unwrap()),
            BiaProcess::new(org, "Helpdesk", ImpactRatings::new(1, 0, 0, 0, 0).unwrap()),
        ];
        rescore_processes(&mut processes, &ImpactWeights::default());
        assert_eq!(processes[0].criticality_score, 20);
        assert_eq!(processes[1].criticality_score, 3);

        let lighter_legal = ImpactWeights {
            legal: 1,
            ..ImpactWeights::default()
        };
        let changed = rescore_processes(&mut processes, &lighter_legal);
        assert_eq!(changed, 1);
        assert_eq!(processes[0].criticality_score, 5);
        assert_eq!(processes[1].criticality_score, 3);
    }
}
