use chrono::Utc;
use log::info;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::catalog::{matches_search, Control};
use crate::core::config::UploadConfig;
use crate::core::middleware::{TenantContext, UserRole};
use crate::history::{change_entry, ChangeAction, EntityType};
use crate::organizations::ensure_registered;
use crate::store::{ComplianceStore, Mutation, StoreError};

use super::error::EvaluationsError;
use super::types::{
    Comment, CreateCommentRequest, Evaluation, EvaluationStatus, EvaluationWithControl, Evidence,
    ListEvaluationsQuery, RegisterEvidenceRequest, UpdateEvaluationRequest,
};

pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];
pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 200;

fn find_control(store: &dyn ComplianceStore, control_code: &str) -> Result<Control, EvaluationsError> {
    store
        .find_control_by_code(control_code)?
        .ok_or_else(|| EvaluationsError::NotFound(format!("Control {control_code} not found")))
}

/// Evaluations are created lazily on the first write touching a control.
/// A fresh one is persisted by the evidence or comment insert that needs it.
fn find_or_new_evaluation(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    control: &Control,
) -> Result<Evaluation, EvaluationsError> {
    Ok(store
        .find_evaluation(organization_id, control.id)?
        .unwrap_or_else(|| Evaluation::new(organization_id, control.id)))
}

fn with_control(control: Control, evaluation: Option<Evaluation>) -> EvaluationWithControl {
    let (evidence_count, comment_count) = evaluation
        .as_ref()
        .map(|e| (e.evidence_count, e.comment_count))
        .unwrap_or_default();
    EvaluationWithControl {
        control,
        evaluation,
        evidence_count,
        comment_count,
    }
}

/// Every matching control paired with the organization's evaluation, if
/// any. Controls without an evaluation match the `not_evaluated` status.
pub fn list_evaluations(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    query: &ListEvaluationsQuery,
) -> Result<Vec<EvaluationWithControl>, EvaluationsError> {
    let mut catalog: Vec<Control> = store
        .list_controls()?
        .into_iter()
        .filter(|c| {
            query
                .domain_code
                .as_ref()
                .map_or(true, |d| &c.domain_code == d)
                && query.is_baseline.map_or(true, |b| c.is_baseline == b)
                && query
                    .search
                    .as_deref()
                    .map_or(true, |s| matches_search(c, s))
        })
        .collect();
    catalog.sort_by(|a, b| {
        a.domain_code
            .cmp(&b.domain_code)
            .then_with(|| a.control_code.cmp(&b.control_code))
    });

    let mut evaluations: HashMap<i32, Evaluation> = store
        .list_evaluations(organization_id)?
        .into_iter()
        .map(|e| (e.control_id, e))
        .collect();

    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    Ok(catalog
        .into_iter()
        .map(|control| {
            let evaluation = evaluations.remove(&control.id);
            (control, evaluation)
        })
        .filter(|(_, evaluation)| match query.status {
            None => true,
            Some(status) => evaluation.as_ref().map(|e| e.status).unwrap_or_default() == status,
        })
        .skip(skip)
        .take(limit)
        .map(|(control, evaluation)| with_control(control, evaluation))
        .collect())
}

pub fn get_evaluation(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    control_code: &str,
) -> Result<EvaluationWithControl, EvaluationsError> {
    let control = find_control(store, control_code)?;
    let evaluation = store.find_evaluation(organization_id, control.id)?;
    Ok(with_control(control, evaluation))
}

/// Records an auditor's judgement on a control.
///
/// When the request does not say whether a non-baseline control applies,
/// the status decides: resetting to `not_evaluated` marks it not
/// applicable, any other status marks it applicable. Baseline controls
/// always apply and keep whatever flag they had.
pub fn update_evaluation(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    control_code: &str,
    req: UpdateEvaluationRequest,
) -> Result<Evaluation, EvaluationsError> {
    tenant.require(UserRole::Auditor)?;
    ensure_registered(store, tenant.organization_id)?;
    let control = find_control(store, control_code)?;

    let existing = store.find_evaluation(tenant.organization_id, control.id)?;
    let old_status = existing.as_ref().map(|e| e.status);
    let mut evaluation =
        existing.unwrap_or_else(|| Evaluation::new(tenant.organization_id, control.id));

    evaluation.status = req.status;
    evaluation.feedback = req.feedback.clone();
    match req.is_applicable {
        Some(flag) => evaluation.is_applicable = Some(flag),
        None if !control.is_baseline => {
            evaluation.is_applicable = Some(req.status != EvaluationStatus::NotEvaluated);
        }
        None => {}
    }
    let now = Utc::now();
    evaluation.auditor_id = Some(tenant.user_id);
    evaluation.evaluated_at = Some(now);
    evaluation.updated_at = now;

    store.commit(Mutation::SaveEvaluation(&evaluation), &|_| {
        change_entry(
            tenant,
            EntityType::Evaluation,
            control.id,
            ChangeAction::Update,
            serde_json::json!({
                "control_code": control.control_code,
                "old_status": old_status,
                "new_status": evaluation.status,
                "feedback": evaluation.feedback,
            }),
        )
    })?;

    info!(
        "Evaluation of {} for organization {} set to {}",
        control.control_code, tenant.organization_id, evaluation.status
    );
    Ok(evaluation)
}

/// `{upload_dir}/{organization}/{uuid}{.ext}` where the extension comes from
/// the submitted file name.
pub fn evidence_path(uploads: &UploadConfig, organization_id: Uuid, file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!(
        "{}/{}/{}{}",
        uploads.upload_dir.trim_end_matches('/'),
        organization_id,
        Uuid::new_v4(),
        extension
    )
}

fn validate_evidence(uploads: &UploadConfig, req: &RegisterEvidenceRequest) -> Result<(), EvaluationsError> {
    if req.file_name.trim().is_empty() {
        return Err(EvaluationsError::Validation(
            "file_name is required".to_string(),
        ));
    }
    if !ALLOWED_MIME_TYPES.contains(&req.file_type.as_str()) {
        return Err(EvaluationsError::Validation(format!(
            "Invalid file type. Only JPG, PNG, and PDF files are allowed. Received: {}",
            req.file_type
        )));
    }
    if req.file_size == 0 || req.file_size > uploads.max_file_size {
        return Err(EvaluationsError::Validation(format!(
            "file_size must be between 1 and {} bytes, got {}",
            uploads.max_file_size, req.file_size
        )));
    }
    Ok(())
}

/// Stores evidence metadata; the bytes are written to `file_path` by the
/// upload gateway.
pub fn register_evidence(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    uploads: &UploadConfig,
    control_code: &str,
    req: RegisterEvidenceRequest,
) -> Result<Evidence, EvaluationsError> {
    tenant.require(UserRole::Auditor)?;
    validate_evidence(uploads, &req)?;
    ensure_registered(store, tenant.organization_id)?;
    let control = find_control(store, control_code)?;
    let evaluation = find_or_new_evaluation(store, tenant.organization_id, &control)?;

    let evidence = Evidence {
        id: Uuid::new_v4(),
        evaluation_id: evaluation.id,
        file_path: evidence_path(uploads, tenant.organization_id, &req.file_name),
        file_name: req.file_name,
        file_type: req.file_type,
        file_size: req.file_size,
        uploaded_by: Some(tenant.user_id),
        uploaded_at: Utc::now(),
    };
    store.commit(
        Mutation::InsertEvidence {
            evaluation: &evaluation,
            evidence: &evidence,
        },
        &|_| {
            change_entry(
                tenant,
                EntityType::Evidence,
                &control.control_code,
                ChangeAction::Upload,
                serde_json::json!({ "file_name": evidence.file_name }),
            )
        },
    )?;

    info!(
        "Evidence {} registered for {} in organization {}",
        evidence.id, control.control_code, tenant.organization_id
    );
    Ok(evidence)
}

/// Newest first; empty when the control was never evaluated.
pub fn list_evidence(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    control_code: &str,
) -> Result<Vec<Evidence>, EvaluationsError> {
    let control = find_control(store, control_code)?;
    match store.find_evaluation(organization_id, control.id)? {
        Some(evaluation) => Ok(store.list_evidence(organization_id, evaluation.id)?),
        None => Ok(Vec::new()),
    }
}

/// Only the uploader or an organization admin may delete evidence.
pub fn delete_evidence(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    control_code: &str,
    evidence_id: Uuid,
) -> Result<Evidence, EvaluationsError> {
    tenant.require(UserRole::Auditor)?;
    let control = find_control(store, control_code)?;
    let not_found = || EvaluationsError::NotFound(format!("Evidence {evidence_id} not found"));

    let evaluation = store
        .find_evaluation(tenant.organization_id, control.id)?
        .ok_or_else(not_found)?;
    let evidence = store
        .find_evidence(tenant.organization_id, evidence_id)?
        .filter(|e| e.evaluation_id == evaluation.id)
        .ok_or_else(not_found)?;

    if evidence.uploaded_by != Some(tenant.user_id) && !tenant.is_admin() {
        return Err(EvaluationsError::Forbidden(
            "You can only delete evidence that you uploaded".to_string(),
        ));
    }

    let deleted = store.commit(
        Mutation::DeleteEvidence {
            organization_id: tenant.organization_id,
            evidence_id,
        },
        &|_| {
            change_entry(
                tenant,
                EntityType::Evidence,
                &control.control_code,
                ChangeAction::Delete,
                serde_json::json!({ "file_name": evidence.file_name }),
            )
        },
    );
    match deleted {
        Err(StoreError::NotFound(_)) => return Err(not_found()),
        other => other?,
    };

    info!("Evidence {} deleted from {}", evidence_id, control.control_code);
    Ok(evidence)
}

pub const COMMENT_PREVIEW_CHARS: usize = 100;

pub fn add_comment(
    store: &dyn ComplianceStore,
    tenant: &TenantContext,
    control_code: &str,
    req: CreateCommentRequest,
) -> Result<Comment, EvaluationsError> {
    tenant.require(UserRole::Commenter)?;
    let content = req.content.trim();
    if content.is_empty() {
        return Err(EvaluationsError::Validation(
            "Comment content is required".to_string(),
        ));
    }
    ensure_registered(store, tenant.organization_id)?;
    let control = find_control(store, control_code)?;
    let evaluation = find_or_new_evaluation(store, tenant.organization_id, &control)?;

    let comment = Comment {
        id: Uuid::new_v4(),
        evaluation_id: evaluation.id,
        user_id: tenant.user_id,
        user_name: tenant.user_name.clone(),
        user_role: Some(tenant.role.to_string()),
        content: content.to_string(),
        created_at: Utc::now(),
    };
    let preview: String = comment.content.chars().take(COMMENT_PREVIEW_CHARS).collect();
    store.commit(
        Mutation::InsertComment {
            evaluation: &evaluation,
            comment: &comment,
        },
        &|_| {
            change_entry(
                tenant,
                EntityType::Comment,
                &control.control_code,
                ChangeAction::Add,
                serde_json::json!({ "content": preview }),
            )
        },
    )?;

    Ok(comment)
}

/// Oldest first.
pub fn list_comments(
    store: &dyn ComplianceStore,
    organization_id: Uuid,
    control_code: &str,
) -> Result<Vec<Comment>, EvaluationsError> {
    let control = find_control(store, control_code)?;
    match store.find_evaluation(organization_id, control.id)? {
        Some(evaluation) => Ok(store.list_comments(organization_id, evaluation.id)?),
        None => Ok(Vec::new()),
    }
}
