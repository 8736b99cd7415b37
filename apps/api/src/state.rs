use std::sync::Arc;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::ingestion::pipeline::IngestionPipeline;
use crate::interactions::recorder::InteractionRecorder;
use crate::jobs::catalog::JobCatalog;
use crate::recommendation::engine::RecommendationEngine;
use crate::storage::CvArchive;
use crate::store::{CvStore, InteractionStore, JobStore};
use crate::vector_index::VectorIndex;

/// External collaborators the services are built from. Production wires
/// Postgres, the embedding service, the vector index and S3; tests wire
/// in-memory fakes.
pub struct Backends {
    pub jobs: Arc<dyn JobStore>,
    pub cvs: Arc<dyn CvStore>,
    pub interactions: Arc<dyn InteractionStore>,
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub archive: Arc<dyn CvArchive>,
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ingestion: Arc<IngestionPipeline>,
    pub recommender: Arc<RecommendationEngine>,
    pub interactions: Arc<InteractionRecorder>,
    pub catalog: Arc<JobCatalog>,
    pub cvs: Arc<dyn CvStore>,
    pub archive: Arc<dyn CvArchive>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Self {
        let Backends {
            jobs,
            cvs,
            interactions,
            embedder,
            index,
            archive,
        } = backends;

        Self {
            config,
            ingestion: Arc::new(IngestionPipeline::new(
                embedder.clone(),
                cvs.clone(),
                index.clone(),
            )),
            recommender: Arc::new(RecommendationEngine::new(
                cvs.clone(),
                jobs.clone(),
                index.clone(),
                embedder.clone(),
            )),
            interactions: Arc::new(InteractionRecorder::new(interactions, jobs.clone())),
            catalog: Arc::new(JobCatalog::new(jobs, index, embedder)),
            cvs,
            archive,
        }
    }
}
