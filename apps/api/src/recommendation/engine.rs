//! Recommendation Engine.
//!
//! Algorithm for `recommend(user_id, top_k)`:
//! 1. latest CV by `uploaded_at` → `NoCvFound` if none
//! 2. fetch that CV's vector from the index → `NoEmbeddingFound` if missing
//! 3. query the job namespace for `top_k` neighbours
//! 4. hydrate ids with one `find_many`; ids missing from the store are dropped and logged
//! 5. sort by score descending, ties by job id ascending
//!
//! An empty list is a valid result.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::embedding::Embedder;
use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::store::{CvStore, JobStore};
use crate::vector_index::{Namespace, ScoredId, VectorIndex};

/// Upper bound for `top_k` and semantic search `limit`.
pub const MAX_TOP_K: usize = 100;

/// A job paired with its similarity score. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub job: JobRow,
    pub score: f32,
}

pub struct RecommendationEngine {
    cvs: Arc<dyn CvStore>,
    jobs: Arc<dyn JobStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl RecommendationEngine {
    pub fn new(
        cvs: Arc<dyn CvStore>,
        jobs: Arc<dyn JobStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            cvs,
            jobs,
            index,
            embedder,
        }
    }

    /// Ranks jobs against the user's most recent CV.
    pub async fn recommend(
        &self,
        user_id: Uuid,
        top_k: usize,
    ) -> Result<Vec<Recommendation>, AppError> {
        check_result_count("top_k", top_k)?;

        let cv = self
            .cvs
            .find_latest_by_owner(user_id)
            .await?
            .ok_or(AppError::NoCvFound(user_id))?;

        let vector = self
            .index
            .fetch(Namespace::Cvs, &cv.id.to_string())
            .await?
            .ok_or(AppError::NoEmbeddingFound(cv.id))?;

        let matches = self.index.query(Namespace::Jobs, &vector, top_k).await?;
        debug!("Index returned {} matches for CV {}", matches.len(), cv.id);

        let recommendations = self.hydrate(matches).await?;
        info!(
            "Recommended {} jobs to user {user_id} from CV {}",
            recommendations.len(),
            cv.id
        );
        Ok(recommendations)
    }

    /// Embeds free text and ranks jobs against it.
    pub async fn search_similar(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation>, AppError> {
        check_result_count("limit", limit)?;
        let vector = self.embedder.embed(text).await?;
        let matches = self.index.query(Namespace::Jobs, &vector, limit).await?;
        self.hydrate(matches).await
    }

    async fn hydrate(&self, matches: Vec<ScoredId>) -> Result<Vec<Recommendation>, AppError> {
        let mut scored: Vec<(Uuid, f32)> = Vec::with_capacity(matches.len());
        for m in matches {
            match Uuid::parse_str(&m.id) {
                Ok(id) => scored.push((id, m.score)),
                Err(_) => warn!("Index drift: job vector id '{}' is not a valid job id", m.id),
            }
        }
        if scored.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = scored.iter().map(|(id, _)| *id).collect();
        let jobs = self.jobs.find_many(&ids).await?;
        Ok(rank(scored, jobs))
    }
}

fn check_result_count(name: &str, value: usize) -> Result<(), AppError> {
    if value == 0 || value > MAX_TOP_K {
        return Err(AppError::InvalidInput(format!(
            "{name} must be between 1 and {MAX_TOP_K}, got {value}"
        )));
    }
    Ok(())
}

/// Zips scores with hydrated jobs, dropping ids with no job record, and sorts
/// by score descending then job id ascending. An id scored more than once
/// keeps its best score.
pub fn rank(scored: Vec<(Uuid, f32)>, jobs: Vec<JobRow>) -> Vec<Recommendation> {
    let mut by_id: HashMap<Uuid, JobRow> = jobs.into_iter().map(|j| (j.id, j)).collect();

    let mut best: HashMap<Uuid, f32> = HashMap::with_capacity(scored.len());
    for (id, score) in scored {
        best.entry(id)
            .and_modify(|s| *s = s.max(score))
            .or_insert(score);
    }

    let mut recommendations: Vec<Recommendation> = Vec::with_capacity(best.len());
    for (id, score) in best {
        match by_id.remove(&id) {
            Some(job) => recommendations.push(Recommendation { job, score }),
            None => warn!("Index drift: job {id} is indexed but missing from the document store"),
        }
    }

    recommendations.sort_by(compare_ranked);
    recommendations
}

fn compare_ranked(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.job.id.to_string().cmp(&b.job.id.to_string()))
}
