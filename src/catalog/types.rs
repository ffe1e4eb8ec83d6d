use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlTypes {
    pub deter: bool,
    pub avoid: bool,
    pub prevent: bool,
    pub detect: bool,
    pub react: bool,
    pub recover: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlObjectives {
    pub confidentiality: bool,
    pub integrity: bool,
    pub availability: bool,
}

/// Cross-references into other frameworks, kept verbatim from the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkMappings {
    pub iso27001_2013: Option<String>,
    pub pci_dss_v31: Option<String>,
    pub sp_800_53_rev4: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id: i32,
    pub control_code: String,
    pub domain_code: String,
    pub domain: String,
    pub domain_objective: Option<String>,
    pub section: Option<String>,
    pub control_statement: Option<String>,
    pub control_summary: Option<String>,
    pub control_description: Option<String>,
    pub is_baseline: bool,
    /// Catalog default, overridden per organization by the evaluation.
    pub is_applicable: bool,
    pub types: ControlTypes,
    pub objectives: ControlObjectives,
    pub mappings: FrameworkMappings,
}

/// Catalog entry before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewControl {
    pub control_code: String,
    pub domain_code: String,
    pub domain: String,
    pub domain_objective: Option<String>,
    pub section: Option<String>,
    pub description: String,
    pub is_baseline: bool,
    pub types: ControlTypes,
    pub objectives: ControlObjectives,
    pub mappings: FrameworkMappings,
}

impl NewControl {
    pub fn into_control(self, id: i32) -> Control {
        Control {
            id,
            control_code: self.control_code,
            domain_code: self.domain_code,
            domain: self.domain,
            domain_objective: self.domain_objective,
            section: self.section,
            control_statement: Some(self.description.clone()),
            control_summary: Some(self.description.clone()),
            control_description: Some(self.description),
            is_baseline: self.is_baseline,
            is_applicable: self.is_baseline,
            types: self.types,
            objectives: self.objectives,
            mappings: self.mappings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlTypeFilter {
    Deter,
    Avoid,
    Prevent,
    Detect,
    React,
    Recover,
}

impl ControlTypeFilter {
    fn matches(self, types: &ControlTypes) -> bool {
        match self {
            Self::Deter => types.deter,
            Self::Avoid => types.avoid,
            Self::Prevent => types.prevent,
            Self::Detect => types.detect,
            Self::React => types.react,
            Self::Recover => types.recover,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveFilter {
    Confidentiality,
    Integrity,
    Availability,
}

impl ObjectiveFilter {
    fn matches(self, objectives: &ControlObjectives) -> bool {
        match self {
            Self::Confidentiality => objectives.confidentiality,
            Self::Integrity => objectives.integrity,
            Self::Availability => objectives.availability,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListControlsQuery {
    pub domain_code: Option<String>,
    pub section: Option<String>,
    pub is_baseline: Option<bool>,
    #[serde(rename = "type")]
    pub type_filter: Option<ControlTypeFilter>,
    #[serde(rename = "objective")]
    pub objective_filter: Option<ObjectiveFilter>,
    pub search: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl ListControlsQuery {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 200;

    pub fn matches(&self, control: &Control) -> bool {
        if let Some(ref domain_code) = self.domain_code {
            if &control.domain_code != domain_code {
                return false;
            }
        }
        if let Some(ref section) = self.section {
            if control.section.as_ref() != Some(section) {
                return false;
            }
        }
        if let Some(is_baseline) = self.is_baseline {
            if control.is_baseline != is_baseline {
                return false;
            }
        }
        if let Some(type_filter) = self.type_filter {
            if !type_filter.matches(&control.types) {
                return false;
            }
        }
        if let Some(objective) = self.objective_filter {
            if !objective.matches(&control.objectives) {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            if !matches_search(control, search) {
                return false;
            }
        }
        true
    }

    pub fn page(&self) -> (usize, usize) {
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        (self.skip.unwrap_or(0), limit)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountControlsQuery {
    pub domain_code: Option<String>,
    pub is_baseline: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlCount {
    pub count: usize,
}

/// Case-insensitive substring match on the control code or summary.
pub fn matches_search(control: &Control, search: &str) -> bool {
    let term = search.to_lowercase();
    control.control_code.to_lowercase().contains(&term)
        || control
            .control_summary
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(&term))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSummary {
    pub domain_code: String,
    pub domain: String,
    pub domain_objective: Option<String>,
    pub control_count: usize,
    pub baseline_count: usize,
}
