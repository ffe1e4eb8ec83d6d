use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classifier::{AssetRatings, SecurityLevel};
use super::criticality::{ImpactRatings, ImpactWeights};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i32,
        max: i32,
        value: i32,
    },
}

pub(crate) fn check_range(field: &'static str, value: i32, min: i32, max: i32) -> Result<u8, RatingError> {
    if (min..=max).contains(&value) {
        Ok(value as u8)
    } else {
        Err(RatingError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub weights: ImpactWeights,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationSettings {
    pub fn with_defaults(organization_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            weights: ImpactWeights::default(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiaProcess {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub impacts: ImpactRatings,
    pub criticality_score: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BiaProcess {
    pub fn new(organization_id: Uuid, name: &str, impacts: ImpactRatings) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: name.to_string(),
            description: None,
            owner: None,
            impacts,
            criticality_score: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationAsset {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub process_id: Uuid,
    pub name: String,
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub ratings: AssetRatings,
    /// Persisted on every write; tier resolution reads it directly.
    pub security_level: SecurityLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InformationAsset {
    pub fn new(organization_id: Uuid, process_id: Uuid, name: &str, ratings: AssetRatings) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            process_id,
            name: name.to_string(),
            asset_type: None,
            description: None,
            ratings,
            security_level: ratings.security_level(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub weight_reputation: Option<i32>,
    pub weight_external: Option<i32>,
    pub weight_internal: Option<i32>,
    pub weight_legal: Option<i32>,
    pub weight_economic: Option<i32>,
}

impl UpdateSettingsRequest {
    pub fn apply_to(&self, current: &ImpactWeights) -> Result<ImpactWeights, RatingError> {
        ImpactWeights::new(
            self.weight_reputation
                .unwrap_or(i32::from(current.reputation)),
            self.weight_external.unwrap_or(i32::from(current.external)),
            self.weight_internal.unwrap_or(i32::from(current.internal)),
            self.weight_legal.unwrap_or(i32::from(current.legal)),
            self.weight_economic.unwrap_or(i32::from(current.economic)),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProcessRequest {
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub impact_reputation: i32,
    #[serde(default)]
    pub impact_external: i32,
    #[serde(default)]
    pub impact_internal: i32,
    #[serde(default)]
    pub impact_legal: i32,
    #[serde(default)]
    pub impact_economic: i32,
}

impl CreateProcessRequest {
    pub fn impacts(&self) -> Result<ImpactRatings, RatingError> {
        ImpactRatings::new(
            self.impact_reputation,
            self.impact_external,
            self.impact_internal,
            self.impact_legal,
            self.impact_economic,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProcessRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub impact_reputation: Option<i32>,
    pub impact_external: Option<i32>,
    pub impact_internal: Option<i32>,
    pub impact_legal: Option<i32>,
    pub impact_economic: Option<i32>,
}

impl UpdateProcessRequest {
    pub fn apply_to(&self, current: &ImpactRatings) -> Result<ImpactRatings, RatingError> {
        ImpactRatings::new(
            self.impact_reputation
                .unwrap_or(i32::from(current.reputation)),
            self.impact_external.unwrap_or(i32::from(current.external)),
            self.impact_internal.unwrap_or(i32::from(current.internal)),
            self.impact_legal.unwrap_or(i32::from(current.legal)),
            self.impact_economic.unwrap_or(i32::from(current.economic)),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssetRequest {
    pub process_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub c_rating: i32,
    #[serde(default)]
    pub i_rating: i32,
    #[serde(default)]
    pub a_rating: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssetRequest {
    pub process_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub c_rating: Option<i32>,
    pub i_rating: Option<i32>,
    pub a_rating: Option<i32>,
}

impl UpdateAssetRequest {
    pub fn apply_to(&self, current: &AssetRatings) -> Result<AssetRatings, RatingError> {
        AssetRatings::new(
            self.c_rating.unwrap_or(i32::from(current.confidentiality())),
            self.i_rating.unwrap_or(i32::from(current.integrity())),
            self.a_rating.unwrap_or(i32::from(current.availability())),
        )
    }
}

/// A process as listed by the BIA register, with the assets it owns.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessWithAssets {
    #[serde(flatten)]
    pub process: BiaProcess,
    pub assets: Vec<InformationAsset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsUpdate {
    pub settings: OrganizationSettings,
    pub processes_rescored: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAssetsQuery {
    pub process_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceLevelResponse {
    pub level: String,
    pub controls: String,
    pub is_assessed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_update_keeps_other_weights() {
        let request = UpdateSettingsRequest {
            weight_legal: Some(1),
            ..UpdateSettingsRequest::default()
        };
        let weights = request.apply_to(&ImpactWeights::default()).unwrap();
        assert_eq!(weights.legal, 1);
        assert_eq!(weights.reputation, 3);
        assert_eq!(weights.economic, 2);
    }

    #[test]
    fn test_settings_update_rejects_zero_weight() {
        let request = UpdateSettingsRequest {
            weight_internal: Some(0),
            ..UpdateSettingsRequest::default()
        };
        let err = request.apply_to(&ImpactWeights::default()).unwrap_err();
        assert_eq!(
            err,
            RatingError::OutOfRange {
                field: "weight_internal",
                min: 1,
                max: 4,
                value: 0
            }
        );
    }

    #[test]
    fn test_new_asset_carries_its_security_level() {
        let asset = InformationAsset::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "HR database",
            AssetRatings::new(2, 1, 0).unwrap(),
        );
        assert_eq!(asset.security_level, SecurityLevel::Medium);
    }
}
