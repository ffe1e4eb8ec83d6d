use serde::{Deserialize, Serialize};

use crate::core::shared::utils::tenths_half_even;

/// Weighted credit, in quarters of a control: fully applied earns 4,
/// partially applied 2, low applied 1.
fn quarter_credits(fully: u64, partial: u64, low: u64) -> u64 {
    4 * fully + 2 * partial + low
}

/// `round((fully + 0.5 * partial + 0.25 * low) / total * 100, 1)`.
///
/// Computed on integers so the tie-break is exact: a result that lands on
/// a half tenth rounds to the even tenth. Returns 0.0 when `total` is zero
/// and never exceeds 100.0.
pub fn calculate_score(fully: usize, partial: usize, low: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let credits = quarter_credits(fully as u64, partial as u64, low as u64);
    // score * 10 = credits / 4 / total * 1000 = credits * 250 / total
    let tenths = tenths_half_even(credits * 250, total as u64).min(1000);
    tenths as f64 / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Amber,
    Red,
}

impl StatusColor {
    pub const GREEN_THRESHOLD: f64 = 80.0;
    pub const AMBER_THRESHOLD: f64 = 50.0;

    pub fn for_score(score: f64) -> Self {
        if score >= Self::GREEN_THRESHOLD {
            Self::Green
        } else if score >= Self::AMBER_THRESHOLD {
            Self::Amber
        } else {
            Self::Red
        }
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Green => "green",
            Self::Amber => "amber",
            Self::Red => "red",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_scores_zero() {
        assert_eq!(calculate_score(0, 0, 0, 0), 0.0);
    }

    #[test]
    fn test_weighted_credits() {
        assert_eq!(calculate_score(1, 0, 0, 1), 100.0);
        assert_eq!(calculate_score(0, 1, 0, 1), 50.0);
        assert_eq!(calculate_score(0, 0, 1, 1), 25.0);
        assert_eq!(calculate_score(1, 1, 1, 3), 58.3);
        assert_eq!(calculate_score(2, 0, 0, 3), 66.7);
    }

    #[test]
    fn test_half_tenth_ties_round_to_even() {
        // 0.25 / 16 * 100 = 1.5625 -> no tie, 1.6
        assert_eq!(calculate_score(0, 0, 1, 16), 1.6);
        // 0.25 / 20 * 100 = 1.25 -> tie, even tenth is 1.2
        assert_eq!(calculate_score(0, 0, 1, 20), 1.2);
        // 0.75 / 20 * 100 = 3.75 -> tie, even tenth is 3.8
        assert_eq!(calculate_score(0, 1, 1, 20), 3.8);
    }

    #[test]
    fn test_score_matches_formula_and_stays_in_range() {
        for total in 1..=12usize {
            for fully in 0..=total {
                for partial in 0..=(total - fully) {
                    for low in 0..=(total - fully - partial) {
                        let score = calculate_score(fully, partial, low, total);
                        let exact = (fully as f64 + 0.5 * partial as f64 + 0.25 * low as f64)
                            / total as f64
                            * 100.0;
                        assert!((0.0..=100.0).contains(&score));
                        assert!((score - exact).abs() <= 0.05 + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_applied_beyond_denominator_is_capped() {
        assert_eq!(calculate_score(5, 0, 0, 3), 100.0);
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(StatusColor::for_score(100.0), StatusColor::Green);
        assert_eq!(StatusColor::for_score(80.0), StatusColor::Green);
        assert_eq!(StatusColor::for_score(79.9), StatusColor::Amber);
        assert_eq!(StatusColor::for_score(50.0), StatusColor::Amber);
        assert_eq!(StatusColor::for_score(49.9), StatusColor::Red);
        assert_eq!(StatusColor::for_score(0.0), StatusColor::Red);
    }
}
