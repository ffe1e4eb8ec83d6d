use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::bia::{
    rescore_processes, score_process, BiaProcess, InformationAsset, OrganizationSettings,
};
use crate::catalog::{Control, NewControl};
use crate::evaluations::{Comment, Evaluation, Evidence};
use crate::history::ChangeHistoryEntry;
use crate::organizations::Organization;

use super::{
    BiaStore, CatalogStore, Committed, EvaluationStore, HistoryStore, Mutation,
    OrganizationStore, StoreError,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    controls: Vec<Control>,
    organizations: HashMap<Uuid, Organization>,
    evaluations: HashMap<Uuid, Evaluation>,
    evidence: Vec<Evidence>,
    comments: Vec<Comment>,
    /// Keyed by organization id.
    settings: HashMap<Uuid, OrganizationSettings>,
    processes: HashMap<Uuid, BiaProcess>,
    assets: HashMap<Uuid, InformationAsset>,
    history: Vec<ChangeHistoryEntry>,
}

impl Tables {
    fn evaluation_of(&self, organization_id: Uuid, evaluation_id: Uuid) -> Option<&Evaluation> {
        self.evaluations
            .get(&evaluation_id)
            .filter(|e| e.organization_id == organization_id)
    }

    fn with_counts(&self, evaluation: &Evaluation) -> Evaluation {
        let mut evaluation = evaluation.clone();
        evaluation.evidence_count = self
            .evidence
            .iter()
            .filter(|e| e.evaluation_id == evaluation.id)
            .count();
        evaluation.comment_count = self
            .comments
            .iter()
            .filter(|c| c.evaluation_id == evaluation.id)
            .count();
        evaluation
    }

    fn require_organization(&self, organization_id: Uuid) -> Result<(), StoreError> {
        if self.organizations.contains_key(&organization_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound("Organization".to_string()))
        }
    }

    fn upsert_evaluation(&mut self, evaluation: &Evaluation) -> Result<(), StoreError> {
        self.require_organization(evaluation.organization_id)?;
        let duplicate = self.evaluations.values().any(|e| {
            e.organization_id == evaluation.organization_id
                && e.control_id == evaluation.control_id
                && e.id != evaluation.id
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "control {} already has an evaluation",
                evaluation.control_id
            )));
        }
        let mut row = evaluation.clone();
        row.evidence_count = 0;
        row.comment_count = 0;
        self.evaluations.insert(row.id, row);
        Ok(())
    }

    fn ensure_evaluation(&mut self, evaluation: &Evaluation) -> Result<(), StoreError> {
        if self.evaluations.contains_key(&evaluation.id) {
            return Ok(());
        }
        self.upsert_evaluation(evaluation)
    }

    fn process_owned(&self, organization_id: Uuid, process_id: Uuid) -> bool {
        self.processes
            .get(&process_id)
            .is_some_and(|p| p.organization_id == organization_id)
    }

    fn asset_owned(&self, organization_id: Uuid, asset_id: Uuid) -> bool {
        self.assets
            .get(&asset_id)
            .is_some_and(|a| a.organization_id == organization_id)
    }

    fn scored(&self, process: &BiaProcess) -> BiaProcess {
        let weights = self
            .settings
            .get(&process.organization_id)
            .map(|s| s.weights)
            .unwrap_or_default();
        let mut process = process.clone();
        process.criticality_score = score_process(&process.impacts, &weights);
        process
    }

    fn apply(&mut self, mutation: Mutation<'_>) -> Result<Committed, StoreError> {
        match mutation {
            Mutation::SaveEvaluation(evaluation) => {
                self.upsert_evaluation(evaluation)?;
                Ok(Committed::Written)
            }
            Mutation::InsertEvidence {
                evaluation,
                evidence,
            } => {
                self.ensure_evaluation(evaluation)?;
                if evidence.evaluation_id != evaluation.id {
                    return Err(StoreError::Conflict(
                        "evidence belongs to another evaluation".to_string(),
                    ));
                }
                self.evidence.push(evidence.clone());
                Ok(Committed::Written)
            }
            Mutation::DeleteEvidence {
                organization_id,
                evidence_id,
            } => {
                let position = self.evidence.iter().position(|e| {
                    e.id == evidence_id
                        && self.evaluation_of(organization_id, e.evaluation_id).is_some()
                });
                let index = position.ok_or_else(|| StoreError::NotFound("Evidence".to_string()))?;
                self.evidence.remove(index);
                Ok(Committed::Written)
            }
            Mutation::InsertComment {
                evaluation,
                comment,
            } => {
                self.ensure_evaluation(evaluation)?;
                if comment.evaluation_id != evaluation.id {
                    return Err(StoreError::Conflict(
                        "comment belongs to another evaluation".to_string(),
                    ));
                }
                self.comments.push(comment.clone());
                Ok(Committed::Written)
            }
            Mutation::UpdateWeights {
                organization_id,
                update,
            } => {
                self.require_organization(organization_id)?;
                let mut settings = self
                    .settings
                    .get(&organization_id)
                    .cloned()
                    .unwrap_or_else(|| OrganizationSettings::with_defaults(organization_id));
                let previous = settings.weights;
                settings.weights = update
                    .apply_to(&previous)
                    .map_err(|e| StoreError::Conflict(e.to_string()))?;
                let now = Utc::now();
                settings.updated_at = now;

                let mut processes: Vec<BiaProcess> = self
                    .processes
                    .values()
                    .filter(|p| p.organization_id == organization_id)
                    .cloned()
                    .collect();
                let processes_rescored = rescore_processes(&mut processes, &settings.weights);
                for mut process in processes {
                    if let Some(stored) = self.processes.get_mut(&process.id) {
                        if stored.criticality_score != process.criticality_score {
                            process.updated_at = now;
                            *stored = process;
                        }
                    }
                }
                self.settings.insert(organization_id, settings.clone());
                Ok(Committed::Weights {
                    previous,
                    settings,
                    processes_rescored,
                })
            }
            Mutation::InsertProcess(process) => {
                self.require_organization(process.organization_id)?;
                if self.processes.contains_key(&process.id) {
                    return Err(StoreError::Conflict(format!(
                        "process {} already exists",
                        process.id
                    )));
                }
                let process = self.scored(process);
                self.processes.insert(process.id, process.clone());
                Ok(Committed::Process(process))
            }
            Mutation::UpdateProcess(process) => {
                if !self.process_owned(process.organization_id, process.id) {
                    return Err(StoreError::NotFound("Process".to_string()));
                }
                let process = self.scored(process);
                self.processes.insert(process.id, process.clone());
                Ok(Committed::Process(process))
            }
            Mutation::DeleteProcess {
                organization_id,
                process_id,
            } => {
                if !self.process_owned(organization_id, process_id) {
                    return Err(StoreError::NotFound("Process".to_string()));
                }
                self.processes.remove(&process_id);
                self.assets.retain(|_, a| a.process_id != process_id);
                Ok(Committed::Written)
            }
            Mutation::InsertAsset(asset) => {
                if self.assets.contains_key(&asset.id) {
                    return Err(StoreError::Conflict(format!(
                        "asset {} already exists",
                        asset.id
                    )));
                }
                if !self.process_owned(asset.organization_id, asset.process_id) {
                    return Err(StoreError::NotFound("Process".to_string()));
                }
                self.assets.insert(asset.id, asset.clone());
                Ok(Committed::Written)
            }
            Mutation::UpdateAsset(asset) => {
                if !self.asset_owned(asset.organization_id, asset.id) {
                    return Err(StoreError::NotFound("Asset".to_string()));
                }
                if !self.process_owned(asset.organization_id, asset.process_id) {
                    return Err(StoreError::NotFound("Process".to_string()));
                }
                self.assets.insert(asset.id, asset.clone());
                Ok(Committed::Written)
            }
            Mutation::DeleteAsset {
                organization_id,
                asset_id,
            } => {
                if !self.asset_owned(organization_id, asset_id) {
                    return Err(StoreError::NotFound("Asset".to_string()));
                }
                self.assets.remove(&asset_id);
                Ok(Committed::Written)
            }
        }
    }

    /// Same keys as the `change_history` table: unique id, registered
    /// organization.
    fn append_history(&mut self, entry: ChangeHistoryEntry) -> Result<(), StoreError> {
        self.require_organization(entry.organization_id)?;
        if self.history.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::Conflict(format!(
                "history entry {} already exists",
                entry.id
            )));
        }
        self.history.push(entry);
        Ok(())
    }
}

/// Store kept entirely in process memory. Backs the test suite and
/// `--memory` runs; everything is lost on shutdown.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Connection("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Connection("in-memory store lock poisoned".to_string()))
    }
}

impl CatalogStore for InMemoryStore {
    fn list_controls(&self) -> Result<Vec<Control>, StoreError> {
        Ok(self.read()?.controls.clone())
    }

    fn find_control_by_code(&self, control_code: &str) -> Result<Option<Control>, StoreError> {
        Ok(self
            .read()?
            .controls
            .iter()
            .find(|c| c.control_code == control_code)
            .cloned())
    }

    fn count_controls(
        &self,
        domain_code: Option<&str>,
        is_baseline: Option<bool>,
    ) -> Result<usize, StoreError> {
        Ok(self
            .read()?
            .controls
            .iter()
            .filter(|c| domain_code.map_or(true, |d| c.domain_code == d))
            .filter(|c| is_baseline.map_or(true, |b| c.is_baseline == b))
            .count())
    }

    fn seed_controls(&self, controls: Vec<NewControl>) -> Result<usize, StoreError> {
        let mut tables = self.write()?;
        if !tables.controls.is_empty() {
            return Ok(0);
        }
        tables.controls = controls
            .into_iter()
            .zip(1..)
            .map(|(control, id)| control.into_control(id))
            .collect();
        Ok(tables.controls.len())
    }
}

impl OrganizationStore for InMemoryStore {
    fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let mut organizations: Vec<Organization> =
            self.read()?.organizations.values().cloned().collect();
        organizations.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(organizations)
    }

    fn find_organization(&self, organization_id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(self.read()?.organizations.get(&organization_id).cloned())
    }

    fn save_organization(&self, organization: &Organization) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let slug_taken = tables
            .organizations
            .values()
            .any(|o| o.slug == organization.slug && o.id != organization.id);
        if slug_taken {
            return Err(StoreError::Conflict(format!(
                "Organization slug {} is already taken",
                organization.slug
            )));
        }
        tables
            .organizations
            .insert(organization.id, organization.clone());
        Ok(())
    }
}

impl EvaluationStore for InMemoryStore {
    fn list_evaluations(&self, organization_id: Uuid) -> Result<Vec<Evaluation>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .evaluations
            .values()
            .filter(|e| e.organization_id == organization_id)
            .map(|e| tables.with_counts(e))
            .collect())
    }

    fn find_evaluation(
        &self,
        organization_id: Uuid,
        control_id: i32,
    ) -> Result<Option<Evaluation>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .evaluations
            .values()
            .find(|e| e.organization_id == organization_id && e.control_id == control_id)
            .map(|e| tables.with_counts(e)))
    }

    fn list_evidence(
        &self,
        organization_id: Uuid,
        evaluation_id: Uuid,
    ) -> Result<Vec<Evidence>, StoreError> {
        let tables = self.read()?;
        if tables.evaluation_of(organization_id, evaluation_id).is_none() {
            return Ok(Vec::new());
        }
        let mut evidence: Vec<Evidence> = tables
            .evidence
            .iter()
            .rev()
            .filter(|e| e.evaluation_id == evaluation_id)
            .cloned()
            .collect();
        evidence.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(evidence)
    }

    fn find_evidence(
        &self,
        organization_id: Uuid,
        evidence_id: Uuid,
    ) -> Result<Option<Evidence>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .evidence
            .iter()
            .find(|e| {
                e.id == evidence_id
                    && tables
                        .evaluation_of(organization_id, e.evaluation_id)
                        .is_some()
            })
            .cloned())
    }

    fn list_comments(
        &self,
        organization_id: Uuid,
        evaluation_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError> {
        let tables = self.read()?;
        if tables.evaluation_of(organization_id, evaluation_id).is_none() {
            return Ok(Vec::new());
        }
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.evaluation_id == evaluation_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

impl BiaStore for InMemoryStore {
    fn find_settings(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationSettings>, StoreError> {
        Ok(self.read()?.settings.get(&organization_id).cloned())
    }

    fn insert_settings(&self, settings: &OrganizationSettings) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.settings.contains_key(&settings.organization_id) {
            return Err(StoreError::Conflict(format!(
                "settings for organization {} already exist",
                settings.organization_id
            )));
        }
        tables
            .settings
            .insert(settings.organization_id, settings.clone());
        Ok(())
    }

    fn list_processes(&self, organization_id: Uuid) -> Result<Vec<BiaProcess>, StoreError> {
        let mut processes: Vec<BiaProcess> = self
            .read()?
            .processes
            .values()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect();
        processes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(processes)
    }

    fn find_process(
        &self,
        organization_id: Uuid,
        process_id: Uuid,
    ) -> Result<Option<BiaProcess>, StoreError> {
        Ok(self
            .read()?
            .processes
            .get(&process_id)
            .filter(|p| p.organization_id == organization_id)
            .cloned())
    }

    fn count_processes(&self, organization_id: Uuid) -> Result<usize, StoreError> {
        Ok(self
            .read()?
            .processes
            .values()
            .filter(|p| p.organization_id == organization_id)
            .count())
    }

    fn list_assets(&self, organization_id: Uuid) -> Result<Vec<InformationAsset>, StoreError> {
        let mut assets: Vec<InformationAsset> = self
            .read()?
            .assets
            .values()
            .filter(|a| a.organization_id == organization_id)
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(assets)
    }

    fn find_asset(
        &self,
        organization_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<InformationAsset>, StoreError> {
        Ok(self
            .read()?
            .assets
            .get(&asset_id)
            .filter(|a| a.organization_id == organization_id)
            .cloned())
    }
}

impl HistoryStore for InMemoryStore {
    fn commit(
        &self,
        mutation: Mutation<'_>,
        audit: &dyn Fn(&Committed) -> ChangeHistoryEntry,
    ) -> Result<Committed, StoreError> {
        let mut tables = self.write()?;
        let mut staged = tables.clone();
        let committed = staged.apply(mutation)?;
        staged.append_history(audit(&committed))?;
        *tables = staged;
        Ok(committed)
    }

    fn list_history(
        &self,
        organization_id: Uuid,
        entity_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ChangeHistoryEntry>, StoreError> {
        Ok(self
            .read()?
            .history
            .iter()
            .rev()
            .filter(|e| e.organization_id == organization_id)
            .filter(|e| entity_type.map_or(true, |t| e.entity_type == t))
            .take(limit)
            .cloned()
            .collect())
    }
}
