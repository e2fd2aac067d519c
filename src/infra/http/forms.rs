use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::types::SubmissionStatus;

use super::{AppState, error::app_error_response};

const SOURCE: &str = "infra::http::forms";

#[derive(Debug, Deserialize)]
pub struct UpdateSubmissionBody {
    pub status: SubmissionStatus,
}

/// Set a form submission's status. The common case is marking it read; the
/// same endpoint archives.
pub async fn update_submission_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSubmissionBody>,
) -> Response {
    match state.dashboard.update_submission_status(id, body.status).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => app_error_response(SOURCE, err),
    }
}

/// Shorthand used by the inbox list view.
pub async fn mark_submission_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.dashboard.mark_submission_read(id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => app_error_response(SOURCE, err),
    }
}

/// Fetch one submission, mostly for the detail pane after a push event.
pub async fn get_submission(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.dashboard.find_submission(id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => app_error_response(SOURCE, err),
    }
}
