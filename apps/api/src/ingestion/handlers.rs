use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, IngestStage};
use crate::ingestion::extract::DocumentFormat;
use crate::ingestion::pipeline::{CvUpload, IngestOutcome};
use crate::models::cv::CvRow;
use crate::state::AppState;
use crate::storage::cv_object_key;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

struct UploadForm {
    user_id: Uuid,
    mime_type: String,
    bytes: Bytes,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut user_id = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("user_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("unreadable user_id: {e}")))?;
                let parsed = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::InvalidInput(format!("invalid user_id '{raw}'")))?;
                user_id = Some(parsed);
            }
            Some("file") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("unreadable file: {e}")))?;
                file = Some((mime_type, bytes));
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| AppError::InvalidInput("user_id is required".into()))?;
    let (mime_type, bytes) =
        file.ok_or_else(|| AppError::InvalidInput("file is required".into()))?;
    if bytes.is_empty() {
        return Err(AppError::InvalidInput("file is empty".into()));
    }

    Ok(UploadForm {
        user_id,
        mime_type,
        bytes,
    })
}

/// POST /api/v1/cvs
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<IngestOutcome>), AppError> {
    let form = read_upload_form(multipart).await?;
    if form.bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::InvalidInput(format!(
            "file exceeds {} bytes",
            state.config.max_upload_bytes
        )));
    }

    // Unsupported types are rejected by the pipeline; only archive what it accepts.
    let mut file_key = None;
    if let Some(format) = DocumentFormat::from_mime(&form.mime_type) {
        let key = cv_object_key(form.user_id, Uuid::new_v4(), format.extension());
        match state
            .archive
            .store(&key, form.bytes.clone(), format.mime())
            .await
        {
            Ok(()) => file_key = Some(key),
            Err(e) => warn!("Archiving CV for user {} failed, continuing: {e}", form.user_id),
        }
    }

    let result = state
        .ingestion
        .ingest(CvUpload {
            user_id: form.user_id,
            mime_type: form.mime_type,
            bytes: form.bytes,
            file_key: file_key.clone(),
        })
        .await;

    match result {
        Ok(outcome) => Ok((StatusCode::CREATED, Json(outcome))),
        Err(e) => {
            // Once persisted, the CV row references the archived file.
            if let (Some(key), false) = (file_key, cv_was_persisted(&e)) {
                if let Err(cleanup) = state.archive.remove(&key).await {
                    warn!("Failed to remove archived CV {key} after failed ingestion: {cleanup}");
                }
            }
            Err(e)
        }
    }
}

fn cv_was_persisted(err: &AppError) -> bool {
    matches!(
        err,
        AppError::IngestionFailed {
            stage: IngestStage::Indexing,
            ..
        }
    )
}

/// POST /api/v1/cvs/:id/reindex
pub async fn handle_reindex_cv(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<IngestOutcome>, AppError> {
    let outcome = state.ingestion.reindex(params.user_id, cv_id).await?;
    Ok(Json(outcome))
}

/// GET /api/v1/cvs/latest
pub async fn handle_latest_cv(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CvRow>, AppError> {
    let cv = state
        .cvs
        .find_latest_by_owner(params.user_id)
        .await?
        .ok_or(AppError::NoCvFound(params.user_id))?;
    Ok(Json(cv))
}
