use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::core::shared::schema::compliance::{comments, evaluations, evidence};
use crate::store::StoreError;

use super::types::{Comment, Evaluation, EvaluationStatus, Evidence};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = evaluations)]
pub struct DbEvaluation {
    pub id: Uuid,
    pub org_id: Uuid,
    pub control_id: i32,
    pub status: String,
    pub is_applicable: Option<bool>,
    pub feedback: Option<String>,
    pub auditor_id: Option<Uuid>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = evidence)]
pub struct DbEvidence {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = comments)]
pub struct DbComment {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Counts are not columns; callers fill them in from grouped queries.
pub fn db_evaluation_to_evaluation(db: DbEvaluation) -> Result<Evaluation, StoreError> {
    let status: EvaluationStatus = db.status.parse().map_err(StoreError::Corrupt)?;
    Ok(Evaluation {
        id: db.id,
        organization_id: db.org_id,
        control_id: db.control_id,
        status,
        is_applicable: db.is_applicable,
        feedback: db.feedback,
        auditor_id: db.auditor_id,
        evaluated_at: db.evaluated_at,
        created_at: db.created_at,
        updated_at: db.updated_at,
        evidence_count: 0,
        comment_count: 0,
    })
}

pub fn evaluation_to_db(evaluation: &Evaluation) -> DbEvaluation {
    DbEvaluation {
        id: evaluation.id,
        org_id: evaluation.organization_id,
        control_id: evaluation.control_id,
        status: evaluation.status.to_string(),
        is_applicable: evaluation.is_applicable,
        feedback: evaluation.feedback.clone(),
        auditor_id: evaluation.auditor_id,
        evaluated_at: evaluation.evaluated_at,
        created_at: evaluation.created_at,
        updated_at: evaluation.updated_at,
    }
}

pub fn db_evidence_to_evidence(db: DbEvidence) -> Evidence {
    Evidence {
        id: db.id,
        evaluation_id: db.evaluation_id,
        file_name: db.file_name,
        file_path: db.file_path,
        file_type: db.file_type,
        file_size: u64::try_from(db.file_size).unwrap_or_default(),
        uploaded_by: db.uploaded_by,
        uploaded_at: db.uploaded_at,
    }
}

pub fn evidence_to_db(evidence: &Evidence) -> DbEvidence {
    DbEvidence {
        id: evidence.id,
        evaluation_id: evidence.evaluation_id,
        file_name: evidence.file_name.clone(),
        file_path: evidence.file_path.clone(),
        file_type: evidence.file_type.clone(),
        file_size: i64::try_from(evidence.file_size).unwrap_or(i64::MAX),
        uploaded_by: evidence.uploaded_by,
        uploaded_at: evidence.uploaded_at,
    }
}

pub fn db_comment_to_comment(db: DbComment) -> Comment {
    Comment {
        id: db.id,
        evaluation_id: db.evaluation_id,
        user_id: db.user_id,
        user_name: db.user_name,
        user_role: db.user_role,
        content: db.content,
        created_at: db.created_at,
    }
}

pub fn comment_to_db(comment: &Comment) -> DbComment {
    DbComment {
        id: comment.id,
        evaluation_id: comment.evaluation_id,
        user_id: comment.user_id,
        user_name: comment.user_name.clone(),
        user_role: comment.user_role.clone(),
        content: comment.content.clone(),
        created_at: comment.created_at,
    }
}
