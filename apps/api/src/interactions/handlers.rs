use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interactions::validation::parse_interaction_type;
use crate::models::interaction::{Interaction, InteractionWithJob};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListInteractionsQuery {
    pub user_id: Uuid,
    pub interaction_type: Option<String>,
}

/// `job_id` stays a string so an unparseable id reports `JOB_NOT_FOUND`
/// instead of a generic body rejection.
#[derive(Deserialize)]
pub struct RecordInteractionRequest {
    pub user_id: Uuid,
    pub job_id: String,
    pub interaction_type: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct RemoveInteractionRequest {
    pub user_id: Uuid,
    pub job_id: String,
    pub interaction_type: String,
}

#[derive(Serialize)]
pub struct InteractionListResponse {
    pub interactions: Vec<InteractionWithJob>,
}

fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::JobNotFound(raw.to_string()))
}

/// POST /api/v1/interactions
pub async fn handle_record_interaction(
    State(state): State<AppState>,
    Json(req): Json<RecordInteractionRequest>,
) -> Result<Json<Interaction>, AppError> {
    // Type is validated before the id so "liked" on a bad id still reads as a type error.
    parse_interaction_type(&req.interaction_type)?;
    let job_id = parse_job_id(&req.job_id)?;
    let interaction = state
        .interactions
        .record(req.user_id, job_id, &req.interaction_type, req.notes)
        .await?;
    Ok(Json(interaction))
}

/// GET /api/v1/interactions
pub async fn handle_list_interactions(
    State(state): State<AppState>,
    Query(params): Query<ListInteractionsQuery>,
) -> Result<Json<InteractionListResponse>, AppError> {
    let interactions = state
        .interactions
        .list(params.user_id, params.interaction_type.as_deref())
        .await?;
    Ok(Json(InteractionListResponse { interactions }))
}

/// DELETE /api/v1/interactions
pub async fn handle_remove_interaction(
    State(state): State<AppState>,
    Json(req): Json<RemoveInteractionRequest>,
) -> Result<StatusCode, AppError> {
    parse_interaction_type(&req.interaction_type)?;
    // Nothing can be stored under an unparseable id, so removal is a no-op.
    if let Ok(job_id) = Uuid::parse_str(req.job_id.trim()) {
        state
            .interactions
            .remove(req.user_id, job_id, &req.interaction_type)
            .await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
