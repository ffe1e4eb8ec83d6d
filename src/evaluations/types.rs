use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Control;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    #[default]
    NotEvaluated,
    FullyApplied,
    PartiallyApplied,
    LowApplied,
    NotApplied,
}

impl EvaluationStatus {
    /// Any degree of implementation, full, partial or low.
    pub fn is_applied(self) -> bool {
        matches!(
            self,
            Self::FullyApplied | Self::PartiallyApplied | Self::LowApplied
        )
    }

    pub fn is_evaluated(self) -> bool {
        self != Self::NotEvaluated
    }
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotEvaluated => "not_evaluated",
            Self::FullyApplied => "fully_applied",
            Self::PartiallyApplied => "partially_applied",
            Self::LowApplied => "low_applied",
            Self::NotApplied => "not_applied",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EvaluationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_evaluated" => Ok(Self::NotEvaluated),
            "fully_applied" => Ok(Self::FullyApplied),
            "partially_applied" => Ok(Self::PartiallyApplied),
            "low_applied" => Ok(Self::LowApplied),
            "not_applied" => Ok(Self::NotApplied),
            _ => Err(format!("Unknown evaluation status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub control_id: i32,
    pub status: EvaluationStatus,
    pub is_applicable: Option<bool>,
    pub feedback: Option<String>,
    pub auditor_id: Option<Uuid>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Filled in by the store when reading; not a column.
    #[serde(default)]
    pub evidence_count: usize,
    #[serde(default)]
    pub comment_count: usize,
}

impl Evaluation {
    pub fn new(organization_id: Uuid, control_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            control_id,
            status: EvaluationStatus::NotEvaluated,
            is_applicable: None,
            feedback: None,
            auditor_id: None,
            evaluated_at: None,
            created_at: now,
            updated_at: now,
            evidence_count: 0,
            comment_count: 0,
        }
    }

    /// Whether a non-baseline control counts toward the organization's
    /// applicable set. Applying a control implies it is applicable even when
    /// the flag was never set, which keeps legacy rows scoring correctly.
    pub fn effective_applicability(&self) -> bool {
        self.is_applicable == Some(true) || self.status.is_applied()
    }

    pub fn has_evidence(&self) -> bool {
        self.evidence_count > 0
    }
}

/// Metadata for an evidence file. The bytes live in external storage at
/// `file_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: u64,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEvaluationRequest {
    pub status: EvaluationStatus,
    pub feedback: Option<String>,
    pub is_applicable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterEvidenceRequest {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEvaluationsQuery {
    pub domain_code: Option<String>,
    pub is_baseline: Option<bool>,
    pub status: Option<EvaluationStatus>,
    pub search: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationWithControl {
    pub control: Control,
    pub evaluation: Option<Evaluation>,
    pub evidence_count: usize,
    pub comment_count: usize,
}
