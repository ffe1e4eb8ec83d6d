//! Read and write model consumed by the scoring core.
//!
//! Every tenant-scoped method takes the caller's organization id and must
//! never return rows belonging to another organization.

pub mod memory;
pub mod postgres;

use uuid::Uuid;

use crate::bia::{
    BiaProcess, ImpactWeights, InformationAsset, OrganizationSettings, UpdateSettingsRequest,
};
use crate::catalog::{Control, NewControl};
use crate::evaluations::{Comment, Evaluation, Evidence};
use crate::history::ChangeHistoryEntry;
use crate::organizations::Organization;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// A tenant write. Stores apply it through [`HistoryStore::commit`] so that
/// the change and its history row land together or not at all.
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    SaveEvaluation(&'a Evaluation),
    /// The evaluation is inserted first when it has no row yet.
    InsertEvidence {
        evaluation: &'a Evaluation,
        evidence: &'a Evidence,
    },
    DeleteEvidence {
        organization_id: Uuid,
        evidence_id: Uuid,
    },
    /// The evaluation is inserted first when it has no row yet.
    InsertComment {
        evaluation: &'a Evaluation,
        comment: &'a Comment,
    },
    /// Applies the update to the stored weights and re-scores every process
    /// of the organization against the result.
    UpdateWeights {
        organization_id: Uuid,
        update: &'a UpdateSettingsRequest,
    },
    /// Process writes are scored against the weights stored at commit time;
    /// the caller's `criticality_score` is ignored.
    InsertProcess(&'a BiaProcess),
    UpdateProcess(&'a BiaProcess),
    DeleteProcess {
        organization_id: Uuid,
        process_id: Uuid,
    },
    InsertAsset(&'a InformationAsset),
    UpdateAsset(&'a InformationAsset),
    DeleteAsset {
        organization_id: Uuid,
        asset_id: Uuid,
    },
}

/// What a committed [`Mutation`] left behind.
#[derive(Debug, Clone, PartialEq)]
pub enum Committed {
    Written,
    Process(BiaProcess),
    Weights {
        previous: ImpactWeights,
        settings: OrganizationSettings,
        processes_rescored: usize,
    },
}

impl Committed {
    pub fn process(&self) -> Option<&BiaProcess> {
        match self {
            Self::Process(process) => Some(process),
            _ => None,
        }
    }
}

pub trait CatalogStore: Send + Sync {
    fn list_controls(&self) -> Result<Vec<Control>, StoreError>;

    fn find_control_by_code(&self, control_code: &str) -> Result<Option<Control>, StoreError>;

    fn count_controls(
        &self,
        domain_code: Option<&str>,
        is_baseline: Option<bool>,
    ) -> Result<usize, StoreError>;

    /// Inserts the given controls only when the catalog is empty. Returns
    /// the number inserted.
    fn seed_controls(&self, controls: Vec<NewControl>) -> Result<usize, StoreError>;
}

pub trait OrganizationStore: Send + Sync {
    fn list_organizations(&self) -> Result<Vec<Organization>, StoreError>;

    fn find_organization(&self, organization_id: Uuid) -> Result<Option<Organization>, StoreError>;

    /// Inserts or renames the organization.
    fn save_organization(&self, organization: &Organization) -> Result<(), StoreError>;
}

pub trait EvaluationStore: Send + Sync {
    /// Evaluations of one organization with evidence and comment counts
    /// filled in.
    fn list_evaluations(&self, organization_id: Uuid) -> Result<Vec<Evaluation>, StoreError>;

    fn find_evaluation(
        &self,
        organization_id: Uuid,
        control_id: i32,
    ) -> Result<Option<Evaluation>, StoreError>;

    fn list_evidence(
        &self,
        organization_id: Uuid,
        evaluation_id: Uuid,
    ) -> Result<Vec<Evidence>, StoreError>;

    fn find_evidence(
        &self,
        organization_id: Uuid,
        evidence_id: Uuid,
    ) -> Result<Option<Evidence>, StoreError>;

    fn list_comments(
        &self,
        organization_id: Uuid,
        evaluation_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError>;
}

pub trait BiaStore: Send + Sync {
    fn find_settings(&self, organization_id: Uuid)
        -> Result<Option<OrganizationSettings>, StoreError>;

    /// Fails with `Conflict` when the organization already has settings.
    fn insert_settings(&self, settings: &OrganizationSettings) -> Result<(), StoreError>;

    /// Oldest first.
    fn list_processes(&self, organization_id: Uuid) -> Result<Vec<BiaProcess>, StoreError>;

    fn find_process(
        &self,
        organization_id: Uuid,
        process_id: Uuid,
    ) -> Result<Option<BiaProcess>, StoreError>;

    fn count_processes(&self, organization_id: Uuid) -> Result<usize, StoreError>;

    fn list_assets(&self, organization_id: Uuid) -> Result<Vec<InformationAsset>, StoreError>;

    fn find_asset(
        &self,
        organization_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<InformationAsset>, StoreError>;
}

pub trait HistoryStore: Send + Sync {
    /// Applies `mutation` and appends the entry `audit` builds from its
    /// outcome in one transaction. A delete or update that matches no row
    /// fails with `NotFound` and writes nothing.
    fn commit(
        &self,
        mutation: Mutation<'_>,
        audit: &dyn Fn(&Committed) -> ChangeHistoryEntry,
    ) -> Result<Committed, StoreError>;

    /// Newest first.
    fn list_history(
        &self,
        organization_id: Uuid,
        entity_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ChangeHistoryEntry>, StoreError>;
}

pub trait ComplianceStore:
    CatalogStore + OrganizationStore + EvaluationStore + BiaStore + HistoryStore
{
}

impl<T> ComplianceStore for T where
    T: CatalogStore + OrganizationStore + EvaluationStore + BiaStore + HistoryStore
{
}
