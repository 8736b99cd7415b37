//! CV ingestion pipeline.
//!
//! State machine per upload:
//! `Received → TextExtracted → Embedded → Persisted → Indexed → Complete`,
//! with `IngestionFailed { stage }` reachable from any state.
//!
//! Extraction failure is degraded, not fatal. Embedding failure aborts before
//! the CV is persisted. An index write failure after persistence leaves an
//! orphaned CV record; `reindex` repairs it from the cached embedding.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::embedding::{Embedder, EmbeddingSource};
use crate::errors::{AppError, IngestStage};
use crate::ingestion::extract::{extract_text, DocumentFormat};
use crate::models::cv::{CvRow, NewCv};
use crate::store::CvStore;
use crate::vector_index::{Namespace, VectorIndex};

/// Progress of a single upload through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    Received,
    TextExtracted,
    Embedded,
    Persisted,
    Indexed,
    Complete,
}

/// An uploaded document handed over by the upload boundary.
#[derive(Debug, Clone)]
pub struct CvUpload {
    pub user_id: Uuid,
    pub mime_type: String,
    pub bytes: Bytes,
    /// Archive location of the original file, if it was stored.
    pub file_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub cv_id: Uuid,
    pub state: IngestState,
    /// True when no text could be extracted and a placeholder was embedded.
    pub degraded: bool,
}

pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    cvs: Arc<dyn CvStore>,
    index: Arc<dyn VectorIndex>,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        cvs: Arc<dyn CvStore>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            embedder,
            cvs,
            index,
        }
    }

    pub async fn ingest(&self, upload: CvUpload) -> Result<IngestOutcome, AppError> {
        let mut state = IngestState::Received;
        let user_id = upload.user_id;
        debug!("CV upload from user {user_id}: {:?}", state);

        let format = DocumentFormat::from_mime(&upload.mime_type).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "unsupported CV content type '{}'; expected PDF, DOC, DOCX or plain text",
                upload.mime_type
            ))
            .at_stage(IngestStage::Extraction)
        })?;

        let extracted_text = match extract_text(upload.bytes, format).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Text extraction failed for user {user_id} ({}): {e}", format.mime());
                String::new()
            }
        };
        let degraded = extracted_text.is_empty();
        if degraded {
            warn!("CV from user {user_id} has no extractable text; embedding placeholder");
        }
        state = advance(state, IngestState::TextExtracted, user_id);

        let source = EmbeddingSource::from_cv(&extracted_text, format.mime());
        let embedding = self
            .embedder
            .embed(source.as_str())
            .await
            .map_err(|e| AppError::from(e).at_stage(IngestStage::Embedding))?;
        state = advance(state, IngestState::Embedded, user_id);

        let cv = self
            .cvs
            .create(NewCv {
                user_id,
                source_format: format.mime().to_string(),
                extracted_text,
                file_key: upload.file_key,
                embedding,
            })
            .await
            .map_err(|e| AppError::from(e).at_stage(IngestStage::Persistence))?;
        state = advance(state, IngestState::Persisted, user_id);

        self.index_cv(&cv).await.map_err(|e| {
            warn!(
                "CV {} persisted but not indexed; recommendations will report no embedding until reindexed",
                cv.id
            );
            e.at_stage(IngestStage::Indexing)
        })?;
        state = advance(state, IngestState::Indexed, user_id);

        state = advance(state, IngestState::Complete, user_id);
        info!("Ingested CV {} for user {user_id} (degraded: {degraded})", cv.id);

        Ok(IngestOutcome {
            cv_id: cv.id,
            state,
            degraded,
        })
    }

    /// Re-upserts the cached embedding of an existing CV owned by `user_id`.
    pub async fn reindex(&self, user_id: Uuid, cv_id: Uuid) -> Result<IngestOutcome, AppError> {
        let cv = self
            .cvs
            .get(cv_id)
            .await?
            .filter(|cv| cv.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;

        if cv.embedding.is_empty() {
            return Err(AppError::NoEmbeddingFound(cv_id));
        }

        self.index_cv(&cv)
            .await
            .map_err(|e| e.at_stage(IngestStage::Indexing))?;
        info!("Reindexed CV {cv_id} for user {user_id}");

        Ok(IngestOutcome {
            cv_id,
            state: IngestState::Complete,
            degraded: cv.extracted_text.is_empty(),
        })
    }

    async fn index_cv(&self, cv: &CvRow) -> Result<(), AppError> {
        self.index
            .upsert(
                Namespace::Cvs,
                &cv.id.to_string(),
                cv.embedding.clone(),
                cv_metadata(cv),
            )
            .await?;
        Ok(())
    }
}

fn advance(from: IngestState, to: IngestState, user_id: Uuid) -> IngestState {
    debug!("CV upload from user {user_id}: {from:?} -> {to:?}");
    to
}

fn cv_metadata(cv: &CvRow) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("kind".to_string(), "cv".to_string()),
        ("cv_id".to_string(), cv.id.to_string()),
        ("user_id".to_string(), cv.user_id.to_string()),
        ("uploaded_at".to_string(), cv.uploaded_at.to_rfc3339()),
    ])
}
