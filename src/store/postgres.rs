use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::error;
use std::collections::HashMap;
use uuid::Uuid;

use crate::bia::storage::{
    asset_to_db, db_asset_to_asset, db_process_to_process, db_settings_to_settings,
    process_to_db, settings_to_db, DbBiaProcess, DbInformationAsset, DbOrganizationSettings,
};
use crate::bia::{
    rescore_processes, score_process, BiaProcess, ImpactWeights, InformationAsset,
    OrganizationSettings,
};
use crate::catalog::storage::{db_control_to_control, new_control_to_db, DbControl};
use crate::catalog::{Control, NewControl};
use crate::core::shared::schema::{
    bia_processes, change_history, comments, controls, evaluations, evidence,
    information_assets, organization_settings, organizations,
};
use crate::core::shared::DbPool;
use crate::evaluations::storage::{
    comment_to_db, db_comment_to_comment, db_evaluation_to_evaluation, db_evidence_to_evidence,
    evaluation_to_db, evidence_to_db, DbComment, DbEvaluation, DbEvidence,
};
use crate::evaluations::{Comment, Evaluation, Evidence};
use crate::history::storage::{db_history_to_entry, entry_to_db_history, DbChangeHistory};
use crate::history::ChangeHistoryEntry;
use crate::organizations::storage::{
    db_organization_to_organization, organization_to_db, DbOrganization,
};
use crate::organizations::Organization;

use super::{
    BiaStore, CatalogStore, Committed, EvaluationStore, HistoryStore, Mutation,
    OrganizationStore, StoreError,
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => StoreError::NotFound("Row".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            other => {
                error!("Database error: {}", other);
                StoreError::Database(other.to_string())
            }
        }
    }
}

impl From<diesel::r2d2::PoolError> for StoreError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        error!("Failed to get database connection: {}", e);
        StoreError::Connection(e.to_string())
    }
}

/// Store backed by PostgreSQL through a shared r2d2 pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PgPooledConnection, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

fn require_organization(conn: &mut PgConnection, organization_id: Uuid) -> Result<(), StoreError> {
    let found: Option<Uuid> = organizations::table
        .find(organization_id)
        .select(organizations::org_id)
        .first(conn)
        .optional()?;
    found
        .map(|_| ())
        .ok_or_else(|| StoreError::NotFound("Organization".to_string()))
}

/// Takes the organization row lock that serializes weight changes against
/// process writes, then returns the weights in force.
fn lock_weights(
    conn: &mut PgConnection,
    organization_id: Uuid,
) -> Result<(Option<OrganizationSettings>, ImpactWeights), StoreError> {
    let locked: Vec<Uuid> = organizations::table
        .filter(organizations::org_id.eq(organization_id))
        .select(organizations::org_id)
        .for_update()
        .load(conn)?;
    if locked.is_empty() {
        return Err(StoreError::NotFound("Organization".to_string()));
    }
    let row: Option<DbOrganizationSettings> = organization_settings::table
        .filter(organization_settings::org_id.eq(organization_id))
        .select(DbOrganizationSettings::as_select())
        .first(conn)
        .optional()?;
    let settings = row.map(db_settings_to_settings).transpose()?;
    let weights = settings.as_ref().map(|s| s.weights).unwrap_or_default();
    Ok((settings, weights))
}

fn process_exists(
    conn: &mut PgConnection,
    organization_id: Uuid,
    process_id: Uuid,
) -> Result<(), StoreError> {
    let count: i64 = bia_processes::table
        .filter(bia_processes::id.eq(process_id))
        .filter(bia_processes::org_id.eq(organization_id))
        .count()
        .get_result(conn)?;
    if count == 0 {
        return Err(StoreError::NotFound("Process".to_string()));
    }
    Ok(())
}

fn not_found_if_zero(affected: usize, entity: &str) -> Result<(), StoreError> {
    if affected == 0 {
        Err(StoreError::NotFound(entity.to_string()))
    } else {
        Ok(())
    }
}

fn insert_evaluation_if_missing(
    conn: &mut PgConnection,
    evaluation: &Evaluation,
) -> Result<(), StoreError> {
    require_organization(conn, evaluation.organization_id)?;
    diesel::insert_into(evaluations::table)
        .values(&evaluation_to_db(evaluation))
        .on_conflict(evaluations::id)
        .do_nothing()
        .execute(conn)?;
    Ok(())
}

fn apply_mutation(conn: &mut PgConnection, mutation: Mutation<'_>) -> Result<Committed, StoreError> {
    match mutation {
        Mutation::SaveEvaluation(evaluation) => {
            require_organization(conn, evaluation.organization_id)?;
            let row = evaluation_to_db(evaluation);
            diesel::insert_into(evaluations::table)
                .values(&row)
                .on_conflict(evaluations::id)
                .do_update()
                .set(&row)
                .execute(conn)?;
            Ok(Committed::Written)
        }
        Mutation::InsertEvidence {
            evaluation,
            evidence: item,
        } => {
            insert_evaluation_if_missing(conn, evaluation)?;
            diesel::insert_into(evidence::table)
                .values(&evidence_to_db(item))
                .execute(conn)?;
            Ok(Committed::Written)
        }
        Mutation::DeleteEvidence {
            organization_id,
            evidence_id,
        } => {
            let owned = evaluations::table
                .filter(evaluations::org_id.eq(organization_id))
                .select(evaluations::id);
            let deleted = diesel::delete(
                evidence::table
                    .filter(evidence::id.eq(evidence_id))
                    .filter(evidence::evaluation_id.eq_any(owned)),
            )
            .execute(conn)?;
            not_found_if_zero(deleted, "Evidence")?;
            Ok(Committed::Written)
        }
        Mutation::InsertComment {
            evaluation,
            comment,
        } => {
            insert_evaluation_if_missing(conn, evaluation)?;
            diesel::insert_into(comments::table)
                .values(&comment_to_db(comment))
                .execute(conn)?;
            Ok(Committed::Written)
        }
        Mutation::UpdateWeights {
            organization_id,
            update,
        } => {
            let (stored, previous) = lock_weights(conn, organization_id)?;
            let mut settings =
                stored.unwrap_or_else(|| OrganizationSettings::with_defaults(organization_id));
            settings.weights = update
                .apply_to(&previous)
                .map_err(|e| StoreError::Conflict(e.to_string()))?;
            let now = chrono::Utc::now();
            settings.updated_at = now;

            let row = settings_to_db(&settings);
            diesel::insert_into(organization_settings::table)
                .values(&row)
                .on_conflict(organization_settings::org_id)
                .do_update()
                .set(&row)
                .execute(conn)?;

            let rows: Vec<DbBiaProcess> = bia_processes::table
                .filter(bia_processes::org_id.eq(organization_id))
                .select(DbBiaProcess::as_select())
                .load(conn)?;
            let mut processes = rows
                .into_iter()
                .map(db_process_to_process)
                .collect::<Result<Vec<_>, _>>()?;
            let before: HashMap<Uuid, u8> = processes
                .iter()
                .map(|p| (p.id, p.criticality_score))
                .collect();
            let processes_rescored = rescore_processes(&mut processes, &settings.weights);
            for process in processes
                .iter()
                .filter(|p| before.get(&p.id) != Some(&p.criticality_score))
            {
                diesel::update(bia_processes::table.find(process.id))
                    .set((
                        bia_processes::criticality_score.eq(i32::from(process.criticality_score)),
                        bia_processes::updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }
            Ok(Committed::Weights {
                previous,
                settings,
                processes_rescored,
            })
        }
        Mutation::InsertProcess(process) => {
            let (_, weights) = lock_weights(conn, process.organization_id)?;
            let mut process = process.clone();
            process.criticality_score = score_process(&process.impacts, &weights);
            diesel::insert_into(bia_processes::table)
                .values(&process_to_db(&process))
                .execute(conn)?;
            Ok(Committed::Process(process))
        }
        Mutation::UpdateProcess(process) => {
            let (_, weights) = lock_weights(conn, process.organization_id)?;
            let mut process = process.clone();
            process.criticality_score = score_process(&process.impacts, &weights);
            let updated = diesel::update(
                bia_processes::table
                    .filter(bia_processes::id.eq(process.id))
                    .filter(bia_processes::org_id.eq(process.organization_id)),
            )
            .set(&process_to_db(&process))
            .execute(conn)?;
            not_found_if_zero(updated, "Process")?;
            Ok(Committed::Process(process))
        }
        Mutation::DeleteProcess {
            organization_id,
            process_id,
        } => {
            diesel::delete(
                information_assets::table
                    .filter(information_assets::process_id.eq(process_id))
                    .filter(information_assets::org_id.eq(organization_id)),
            )
            .execute(conn)?;
            let deleted = diesel::delete(
                bia_processes::table
                    .filter(bia_processes::id.eq(process_id))
                    .filter(bia_processes::org_id.eq(organization_id)),
            )
            .execute(conn)?;
            not_found_if_zero(deleted, "Process")?;
            Ok(Committed::Written)
        }
        Mutation::InsertAsset(asset) => {
            process_exists(conn, asset.organization_id, asset.process_id)?;
            diesel::insert_into(information_assets::table)
                .values(&asset_to_db(asset))
                .execute(conn)?;
            Ok(Committed::Written)
        }
        Mutation::UpdateAsset(asset) => {
            process_exists(conn, asset.organization_id, asset.process_id)?;
            let updated = diesel::update(
                information_assets::table
                    .filter(information_assets::id.eq(asset.id))
                    .filter(information_assets::org_id.eq(asset.organization_id)),
            )
            .set(&asset_to_db(asset))
            .execute(conn)?;
            not_found_if_zero(updated, "Asset")?;
            Ok(Committed::Written)
        }
        Mutation::DeleteAsset {
            organization_id,
            asset_id,
        } => {
            let deleted = diesel::delete(
                information_assets::table
                    .filter(information_assets::id.eq(asset_id))
                    .filter(information_assets::org_id.eq(organization_id)),
            )
            .execute(conn)?;
            not_found_if_zero(deleted, "Asset")?;
            Ok(Committed::Written)
        }
    }
}

fn count_by_evaluation(ids: Vec<Uuid>) -> HashMap<Uuid, usize> {
    let mut counts = HashMap::new();
    for id in ids {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

impl CatalogStore for PgStore {
    fn list_controls(&self) -> Result<Vec<Control>, StoreError> {
        let mut conn = self.conn()?;
        let rows: Vec<DbControl> = controls::table
            .select(DbControl::as_select())
            .order(controls::id.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(db_control_to_control).collect())
    }

    fn find_control_by_code(&self, control_code: &str) -> Result<Option<Control>, StoreError> {
        let mut conn = self.conn()?;
        let row: Option<DbControl> = controls::table
            .filter(controls::control_code.eq(control_code))
            .select(DbControl::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(db_control_to_control))
    }

    fn count_controls(
        &self,
        domain_code: Option<&str>,
        is_baseline: Option<bool>,
    ) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let mut query = controls::table
            .select(diesel::dsl::count_star())
            .into_boxed();
        if let Some(domain_code) = domain_code {
            query = query.filter(controls::domain_code.eq(domain_code.to_string()));
        }
        if let Some(is_baseline) = is_baseline {
            query = query.filter(controls::is_baseline.eq(is_baseline));
        }
        let count: i64 = query.get_result(&mut conn)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn seed_controls(&self, new_controls: Vec<NewControl>) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let rows: Vec<_> = new_controls.into_iter().map(new_control_to_db).collect();

        let inserted = conn.transaction::<_, DieselError, _>(|conn| {
            let existing: i64 = controls::table.count().get_result(conn)?;
            if existing > 0 {
                return Ok(0);
            }
            diesel::insert_into(controls::table)
                .values(&rows)
                .execute(conn)
        })?;
        Ok(inserted)
    }
}

impl OrganizationStore for PgStore {
    fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let mut conn = self.conn()?;
        let rows: Vec<DbOrganization> = organizations::table
            .select(DbOrganization::as_select())
            .order(organizations::slug.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(db_organization_to_organization).collect())
    }

    fn find_organization(&self, organization_id: Uuid) -> Result<Option<Organization>, StoreError> {
        let mut conn = self.conn()?;
        let row: Option<DbOrganization> = organizations::table
            .find(organization_id)
            .select(DbOrganization::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(db_organization_to_organization))
    }

    fn save_organization(&self, organization: &Organization) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let row = organization_to_db(organization);
        diesel::insert_into(organizations::table)
            .values(&row)
            .on_conflict(organizations::org_id)
            .do_update()
            .set((
                organizations::name.eq(&row.name),
                organizations::slug.eq(&row.slug),
            ))
            .execute(&mut conn)?;
        Ok(())
    }
}

impl EvaluationStore for PgStore {
    fn list_evaluations(&self, organization_id: Uuid) -> Result<Vec<Evaluation>, StoreError> {
        let mut conn = self.conn()?;
        let rows: Vec<DbEvaluation> = evaluations::table
            .filter(evaluations::org_id.eq(organization_id))
            .select(DbEvaluation::as_select())
            .load(&mut conn)?;

        let evidence_counts = count_by_evaluation(
            evidence::table
                .inner_join(evaluations::table)
                .filter(evaluations::org_id.eq(organization_id))
                .select(evidence::evaluation_id)
                .load(&mut conn)?,
        );
        let comment_counts = count_by_evaluation(
            comments::table
                .inner_join(evaluations::table)
                .filter(evaluations::org_id.eq(organization_id))
                .select(comments::evaluation_id)
                .load(&mut conn)?,
        );

        rows.into_iter()
            .map(|row| {
                let mut evaluation = db_evaluation_to_evaluation(row)?;
                evaluation.evidence_count =
                    evidence_counts.get(&evaluation.id).copied().unwrap_or(0);
                evaluation.comment_count = comment_counts.get(&evaluation.id).copied().unwrap_or(0);
                Ok(evaluation)
            })
            .collect()
    }

    fn find_evaluation(
        &self,
        organization_id: Uuid,
        control_id: i32,
    ) -> Result<Option<Evaluation>, StoreError> {
        let mut conn = self.conn()?;
        let row: Option<DbEvaluation> = evaluations::table
            .filter(evaluations::org_id.eq(organization_id))
            .filter(evaluations::control_id.eq(control_id))
            .select(DbEvaluation::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut evaluation = db_evaluation_to_evaluation(row)?;
        let evidence_count: i64 = evidence::table
            .filter(evidence::evaluation_id.eq(evaluation.id))
            .count()
            .get_result(&mut conn)?;
        let comment_count: i64 = comments::table
            .filter(comments::evaluation_id.eq(evaluation.id))
            .count()
            .get_result(&mut conn)?;
        evaluation.evidence_count = usize::try_from(evidence_count).unwrap_or_default();
        evaluation.comment_count = usize::try_from(comment_count).unwrap_or_default();
        Ok(Some(evaluation))
    }

    fn list_evidence(
        &self,
        organization_id: Uuid,
        evaluation_id: Uuid,
    ) -> Result<Vec<Evidence>, StoreError> {
        let mut conn = self.conn()?;
        let rows: Vec<DbEvidence> = evidence::table
            .inner_join(evaluations::table)
            .filter(evidence::evaluation_id.eq(evaluation_id))
            .filter(evaluations::org_id.eq(organization_id))
            .select(DbEvidence::as_select())
            .order(evidence::uploaded_at.desc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(db_evidence_to_evidence).collect())
    }

    fn find_evidence(
        &self,
        organization_id: Uuid,
        evidence_id: Uuid,
    ) -> Result<Option<Evidence>, StoreError> {
        let mut conn = self.conn()?;
        let row: Option<DbEvidence> = evidence::table
            .inner_join(evaluations::table)
            .filter(evidence::id.eq(evidence_id))
            .filter(evaluations::org_id.eq(organization_id))
            .select(DbEvidence::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(db_evidence_to_evidence))
    }

    fn list_comments(
        &self,
        organization_id: Uuid,
        evaluation_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError> {
        let mut conn = self.conn()?;
        let rows: Vec<DbComment> = comments::table
            .inner_join(evaluations::table)
            .filter(comments::evaluation_id.eq(evaluation_id))
            .filter(evaluations::org_id.eq(organization_id))
            .select(DbComment::as_select())
            .order(comments::created_at.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(db_comment_to_comment).collect())
    }
}

impl BiaStore for PgStore {
    fn find_settings(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationSettings>, StoreError> {
        let mut conn = self.conn()?;
        let row: Option<DbOrganizationSettings> = organization_settings::table
            .filter(organization_settings::org_id.eq(organization_id))
            .select(DbOrganizationSettings::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(db_settings_to_settings).transpose()
    }

    fn insert_settings(&self, settings: &OrganizationSettings) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        diesel::insert_into(organization_settings::table)
            .values(&settings_to_db(settings))
            .execute(&mut conn)?;
        Ok(())
    }

    fn list_processes(&self, organization_id: Uuid) -> Result<Vec<BiaProcess>, StoreError> {
        let mut conn = self.conn()?;
        let rows: Vec<DbBiaProcess> = bia_processes::table
            .filter(bia_processes::org_id.eq(organization_id))
            .select(DbBiaProcess::as_select())
            .order(bia_processes::created_at.asc())
            .load(&mut conn)?;
        rows.into_iter().map(db_process_to_process).collect()
    }

    fn find_process(
        &self,
        organization_id: Uuid,
        process_id: Uuid,
    ) -> Result<Option<BiaProcess>, StoreError> {
        let mut conn = self.conn()?;
        let row: Option<DbBiaProcess> = bia_processes::table
            .filter(bia_processes::id.eq(process_id))
            .filter(bia_processes::org_id.eq(organization_id))
            .select(DbBiaProcess::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(db_process_to_process).transpose()
    }

    fn count_processes(&self, organization_id: Uuid) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let count: i64 = bia_processes::table
            .filter(bia_processes::org_id.eq(organization_id))
            .count()
            .get_result(&mut conn)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn list_assets(&self, organization_id: Uuid) -> Result<Vec<InformationAsset>, StoreError> {
        let mut conn = self.conn()?;
        let rows: Vec<DbInformationAsset> = information_assets::table
            .filter(information_assets::org_id.eq(organization_id))
            .select(DbInformationAsset::as_select())
            .order(information_assets::created_at.asc())
            .load(&mut conn)?;
        rows.into_iter().map(db_asset_to_asset).collect()
    }

    fn find_asset(
        &self,
        organization_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<InformationAsset>, StoreError> {
        let mut conn = self.conn()?;
        let row: Option<DbInformationAsset> = information_assets::table
            .filter(information_assets::id.eq(asset_id))
            .filter(information_assets::org_id.eq(organization_id))
            .select(DbInformationAsset::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(db_asset_to_asset).transpose()
    }
}

impl HistoryStore for PgStore {
    fn commit(
        &self,
        mutation: Mutation<'_>,
        audit: &dyn Fn(&Committed) -> ChangeHistoryEntry,
    ) -> Result<Committed, StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let committed = apply_mutation(conn, mutation)?;
            diesel::insert_into(change_history::table)
                .values(&entry_to_db_history(&audit(&committed)))
                .execute(conn)?;
            Ok(committed)
        })
    }

    fn list_history(
        &self,
        organization_id: Uuid,
        entity_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ChangeHistoryEntry>, StoreError> {
        let mut conn = self.conn()?;
        let mut query = change_history::table
            .filter(change_history::org_id.eq(organization_id))
            .select(DbChangeHistory::as_select())
            .into_boxed();
        if let Some(entity_type) = entity_type {
            query = query.filter(change_history::entity_type.eq(entity_type.to_string()));
        }
        let rows: Vec<DbChangeHistory> = query
            .order(change_history::created_at.desc())
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .load(&mut conn)?;
        Ok(rows.into_iter().map(db_history_to_entry).collect())
    }
}
