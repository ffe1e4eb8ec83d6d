use serde::{Deserialize, Serialize};

use super::classifier::SecurityLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BiaTier {
    Low,
    Medium,
    High,
}

impl BiaTier {
    /// Additional (non-baseline) controls expected per domain at this tier.
    pub fn additional_controls_per_domain(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl From<SecurityLevel> for BiaTier {
    fn from(level: SecurityLevel) -> Self {
        match level {
            SecurityLevel::Low => Self::Low,
            SecurityLevel::Medium => Self::Medium,
            SecurityLevel::High => Self::High,
        }
    }
}

impl std::fmt::Display for BiaTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierResolution {
    pub tier: BiaTier,
    pub additional_controls_per_domain: usize,
    /// False when the organization has no BIA processes, so a Low tier
    /// means "not assessed yet" rather than "low risk".
    pub is_assessed: bool,
}

impl TierResolution {
    pub fn new(tier: BiaTier, is_assessed: bool) -> Self {
        Self {
            tier,
            additional_controls_per_domain: tier.additional_controls_per_domain(),
            is_assessed,
        }
    }

    pub fn unassessed() -> Self {
        Self::new(BiaTier::Low, false)
    }

    /// Dashboard wording of the tier's control target.
    pub fn target_label(&self) -> &'static str {
        match (self.tier, self.is_assessed) {
            (BiaTier::High, _) => "Baseline + 2 Controls",
            (BiaTier::Medium, _) => "Baseline + 1 Control",
            (BiaTier::Low, true) => "Baseline Controls Only",
            (BiaTier::Low, false) => "Baseline (Default - BIA Required)",
        }
    }

    /// Short form used by the compliance-level endpoint.
    pub fn controls_label(&self) -> &'static str {
        match self.tier {
            BiaTier::High => "Baseline + 2+",
            BiaTier::Medium => "Baseline + 1+",
            BiaTier::Low => "Baseline",
        }
    }
}

impl Default for TierResolution {
    fn default() -> Self {
        Self::unassessed()
    }
}

/// The organization tier is the highest security level among its assets.
pub fn resolve_tier<I>(asset_levels: I, process_count: usize) -> TierResolution
where
    I: IntoIterator<Item = SecurityLevel>,
{
    let tier = asset_levels
        .into_iter()
        .max()
        .map(BiaTier::from)
        .unwrap_or(BiaTier::Low);

    TierResolution::new(tier, process_count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_asset_wins_regardless_of_order() {
        let a = resolve_tier([SecurityLevel::High, SecurityLevel::Low], 1);
        let b = resolve_tier([SecurityLevel::Low, SecurityLevel::High], 1);
        assert_eq!(a, b);
        assert_eq!(a.tier, BiaTier::High);
        assert_eq!(a.additional_controls_per_domain, 2);
    }

    #[test]
    fn test_medium_tier() {
        let resolution = resolve_tier([SecurityLevel::Low, SecurityLevel::Medium], 2);
        assert_eq!(resolution.tier, BiaTier::Medium);
        assert_eq!(resolution.additional_controls_per_domain, 1);
        assert_eq!(resolution.target_label(), "Baseline + 1 Control");
    }

    #[test]
    fn test_zero_processes_is_unassessed_low() {
        let resolution = resolve_tier(Vec::<SecurityLevel>::new(), 0);
        assert_eq!(resolution.tier, BiaTier::Low);
        assert_eq!(resolution.additional_controls_per_domain, 0);
        assert!(!resolution.is_assessed);
        assert_eq!(resolution.target_label(), "Baseline (Default - BIA Required)");
    }

    #[test]
    fn test_assessed_low_is_distinguishable() {
        let resolution = resolve_tier([SecurityLevel::Low], 1);
        assert_eq!(resolution.tier, BiaTier::Low);
        assert!(resolution.is_assessed);
        assert_eq!(resolution.target_label(), "Baseline Controls Only");
    }
}
