pub mod error;
pub mod handlers;
pub mod service;
pub mod storage;
pub mod types;

use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use error::EvaluationsError;
pub use handlers::*;
pub use types::*;

pub fn configure_evaluations_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/evaluations", get(handle_list_evaluations))
        .route(
            "/api/evaluations/:control_code",
            get(handle_get_evaluation).put(handle_update_evaluation),
        )
        .route(
            "/api/evaluations/:control_code/evidence",
            get(handle_list_evidence).post(handle_register_evidence),
        )
        .route(
            "/api/evaluations/:control_code/evidence/:evidence_id",
            delete(handle_delete_evidence),
        )
        .route(
            "/api/evaluations/:control_code/comments",
            get(handle_list_comments).post(handle_add_comment),
        )
}
