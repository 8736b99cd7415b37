use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::recommendation::engine::Recommendation;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RecommendationQuery {
    pub user_id: Uuid,
    pub top_k: Option<usize>,
}

#[derive(Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}

/// GET /api/v1/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let top_k = params.top_k.unwrap_or(state.config.default_top_k);
    let recommendations = state.recommender.recommend(params.user_id, top_k).await?;
    Ok(Json(RecommendationResponse { recommendations }))
}
