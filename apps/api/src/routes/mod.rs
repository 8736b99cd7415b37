pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ingestion::handlers as cvs;
use crate::interactions::handlers as interactions;
use crate::jobs::handlers as jobs;
use crate::recommendation::handlers as recommendations;
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Job catalogue
        .route(
            "/api/v1/jobs",
            get(jobs::handle_search_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // CV ingestion
        .route(
            "/api/v1/cvs",
            post(cvs::handle_upload_cv).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/cvs/latest", get(cvs::handle_latest_cv))
        .route("/api/v1/cvs/:id/reindex", post(cvs::handle_reindex_cv))
        // Recommendations
        .route(
            "/api/v1/recommendations",
            get(recommendations::handle_recommendations),
        )
        // Interactions
        .route(
            "/api/v1/interactions",
            get(interactions::handle_list_interactions)
                .post(interactions::handle_record_interaction)
                .delete(interactions::handle_remove_interaction),
        )
        .with_state(state)
}
