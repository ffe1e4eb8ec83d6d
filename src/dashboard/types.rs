use serde::{Deserialize, Serialize};

use crate::evaluations::EvaluationStatus;

/// One control of a domain as seen by the caller's organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainControlDetail {
    pub control_code: String,
    pub control_summary: Option<String>,
    pub is_baseline: bool,
    /// The organization's override when it has one, else the catalog default.
    pub is_applicable: bool,
    pub status: EvaluationStatus,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDetails {
    pub domain_code: String,
    pub domain: String,
    pub domain_objective: Option<String>,
    pub controls: Vec<DomainControlDetail>,
}
