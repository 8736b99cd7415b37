use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An uploaded CV. Immutable once written; a re-upload creates a new row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CvRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_format: String,
    /// Empty when extraction failed or the format has no extractor.
    pub extracted_text: String,
    pub file_key: Option<String>,
    /// Cached copy of the vector upserted into the index.
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCv {
    pub user_id: Uuid,
    pub source_format: String,
    pub extracted_text: String,
    pub file_key: Option<String>,
    pub embedding: Vec<f32>,
}
