use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRow, JobSearch, NewJob};
use crate::recommendation::engine::Recommendation;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Deserialize)]
pub struct JobSearchQuery {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub salary_range: Option<String>,
    pub experience_level: Option<String>,
    /// Comma-separated; a job must require all of them.
    pub skills: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub semantic: bool,
}

/// Catalogue search returns plain jobs; semantic search adds scores.
#[derive(Serialize)]
#[serde(untagged)]
pub enum JobSearchResponse {
    Catalogue {
        jobs: Vec<JobRow>,
        page: u32,
        limit: u32,
    },
    Semantic {
        jobs: Vec<Recommendation>,
    },
}

/// GET /api/v1/jobs
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobSearchQuery>,
) -> Result<Json<JobSearchResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if params.semantic {
        let text = params.keyword.unwrap_or_default();
        let jobs = state.recommender.search_similar(&text, limit as usize).await?;
        return Ok(Json(JobSearchResponse::Semantic { jobs }));
    }

    let page = params.page.unwrap_or(1).max(1);
    let criteria = JobSearch {
        keyword: params.keyword,
        location: params.location,
        industry: params.industry,
        salary_range: params.salary_range,
        experience_level: params.experience_level,
        skills: params
            .skills
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
    };
    let jobs = state.catalog.search(&criteria, page, limit).await?;
    Ok(Json(JobSearchResponse::Catalogue { jobs, page, limit }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(state.catalog.get(id).await?))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(job): Json<NewJob>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let job = state.catalog.create(job).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(job): Json<NewJob>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(state.catalog.update(id, job).await?))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
