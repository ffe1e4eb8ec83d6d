use serde::{Deserialize, Serialize};

use super::types::{check_range, RatingError};

/// Confidentiality runs one step higher than integrity and availability in
/// the NIA policy.
pub const MAX_CONFIDENTIALITY: i32 = 4;
pub const MAX_INTEGRITY: i32 = 3;
pub const MAX_AVAILABILITY: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SecurityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" | "low" => Ok(Self::Low),
            "Medium" | "medium" => Ok(Self::Medium),
            "High" | "high" => Ok(Self::High),
            _ => Err(format!("Unknown security level: {s}")),
        }
    }
}

/// Validated C/I/A ratings of an information asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRatings {
    confidentiality: u8,
    integrity: u8,
    availability: u8,
}

impl AssetRatings {
    pub fn new(confidentiality: i32, integrity: i32, availability: i32) -> Result<Self, RatingError> {
        Ok(Self {
            confidentiality: check_range("c_rating", confidentiality, 0, MAX_CONFIDENTIALITY)?,
            integrity: check_range("i_rating", integrity, 0, MAX_INTEGRITY)?,
            availability: check_range("a_rating", availability, 0, MAX_AVAILABILITY)?,
        })
    }

    pub fn confidentiality(&self) -> u8 {
        self.confidentiality
    }

    pub fn integrity(&self) -> u8 {
        self.integrity
    }

    pub fn availability(&self) -> u8 {
        self.availability
    }

    pub fn security_level(&self) -> SecurityLevel {
        classify_asset(self.confidentiality, self.integrity, self.availability)
    }
}

/// The highest of the three ratings decides: 3 and above is High, 2 is
/// Medium, anything lower is Low.
pub fn classify_asset(c_rating: u8, i_rating: u8, a_rating: u8) -> SecurityLevel {
    match c_rating.max(i_rating).max(a_rating) {
        3.. => SecurityLevel::High,
        2 => SecurityLevel::Medium,
        _ => SecurityLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_uses_highest_rating() {
        assert_eq!(classify_asset(3, 0, 0), SecurityLevel::High);
        assert_eq!(classify_asset(2, 2, 0), SecurityLevel::Medium);
        assert_eq!(classify_asset(1, 1, 1), SecurityLevel::Low);
        assert_eq!(classify_asset(0, 3, 0), SecurityLevel::High);
        assert_eq!(classify_asset(0, 0, 2), SecurityLevel::Medium);
        assert_eq!(classify_asset(4, 0, 0), SecurityLevel::High);
        assert_eq!(classify_asset(0, 0, 0), SecurityLevel::Low);
    }

    #[test]
    fn test_classify_is_order_independent() {
        for (c, i, a) in [(3, 1, 0), (0, 2, 1), (1, 1, 0)] {
            let level = classify_asset(c, i, a);
            assert_eq!(classify_asset(i, a, c), level);
            assert_eq!(classify_asset(a, c, i), level);
        }
    }

    #[test]
    fn test_ratings_enforce_asymmetric_ranges() {
        assert!(AssetRatings::new(4, 3, 3).is_ok());
        assert!(AssetRatings::new(5, 0, 0).is_err());
        assert!(AssetRatings::new(0, 4, 0).is_err());
        assert!(AssetRatings::new(0, 0, 4).is_err());
        assert!(AssetRatings::new(-1, 0, 0).is_err());
    }

    #[test]
    fn test_security_level_parses_both_cases() {
        assert_eq!("High".parse::<SecurityLevel>(), Ok(SecurityLevel::High));
        assert_eq!("medium".parse::<SecurityLevel>(), Ok(SecurityLevel::Medium));
        assert!("Critical".parse::<SecurityLevel>().is_err());
        assert!(SecurityLevel::High > SecurityLevel::Medium);
    }
}
