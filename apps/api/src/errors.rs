use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;
use crate::vector_index::IndexError;

/// Stage at which a CV ingestion aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Extraction,
    Embedding,
    Persistence,
    Indexing,
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IngestStage::Extraction => "extraction",
            IngestStage::Embedding => "embedding",
            IngestStage::Persistence => "persistence",
            IngestStage::Indexing => "indexing",
        };
        f.write_str(name)
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Vector index write failed: {0}")]
    IndexWrite(String),

    #[error("Vector index query failed: {0}")]
    IndexQuery(String),

    #[error("No CV found for user {0}")]
    NoCvFound(uuid::Uuid),

    #[error("No embedding found for CV {0}")]
    NoEmbeddingFound(uuid::Uuid),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid interaction type: {0}")]
    InvalidInteractionType(String),

    #[error("Ingestion failed at {stage}: {source}")]
    IngestionFailed {
        stage: IngestStage,
        #[source]
        source: Box<AppError>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wraps an error with the ingestion stage it aborted at.
    pub fn at_stage(self, stage: IngestStage) -> Self {
        AppError::IngestionFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// Stable machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::EmbeddingService(_) => "EMBEDDING_SERVICE_ERROR",
            AppError::IndexWrite(_) => "INDEX_WRITE_ERROR",
            AppError::IndexQuery(_) => "INDEX_QUERY_ERROR",
            AppError::NoCvFound(_) => "NO_CV_FOUND",
            AppError::NoEmbeddingFound(_) => "NO_EMBEDDING_FOUND",
            AppError::JobNotFound(_) => "JOB_NOT_FOUND",
            AppError::InvalidInteractionType(_) => "INVALID_INTERACTION_TYPE",
            AppError::IngestionFailed { .. } => "INGESTION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Remote dependency failures; callers may retry these with backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::EmbeddingService(_) | AppError::IndexWrite(_) | AppError::IndexQuery(_) => {
                true
            }
            AppError::IngestionFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidInteractionType(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NoCvFound(_)
            | AppError::NoEmbeddingFound(_)
            | AppError::JobNotFound(_)
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmbeddingService(_) | AppError::IndexWrite(_) | AppError::IndexQuery(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::IngestionFailed { source, .. } => match source.status() {
                StatusCode::BAD_REQUEST => StatusCode::BAD_REQUEST,
                StatusCode::BAD_GATEWAY => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                "A storage error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::IngestionFailed { stage, source } => {
                format!("CV ingestion failed at {stage}: {}", source.public_message())
            }
            other => other.to_string(),
        }
    }
}

impl From<EmbeddingError> for AppError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::InvalidInput(msg) => AppError::InvalidInput(msg),
            other => AppError::EmbeddingService(other.to_string()),
        }
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::InvalidTopK(k) => {
                AppError::InvalidInput(format!("top_k must be at least 1, got {k}"))
            }
            IndexError::Write(msg) => AppError::IndexWrite(msg),
            IndexError::Query(msg) => AppError::IndexQuery(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
                "retryable": self.is_retryable()
            }
        }));

        (status, body).into_response()
    }
}
