//! Document store adapters: the system of record for jobs, CVs and
//! interactions.
//!
//! Services depend on these traits; `Pg*` implementations share one injected
//! `PgPool`.
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::cv::{CvRow, NewCv};
use crate::models::interaction::{Interaction, InteractionType};
use crate::models::job::{JobRow, JobSearch, NewJob};

pub mod cvs;
pub mod interactions;
pub mod jobs;

pub use cvs::PgCvStore;
pub use interactions::PgInteractionStore;
pub use jobs::PgJobStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("invalid stored value: {0}")]
    InvalidValue(String),

    /// A foreign key pointed at a row that no longer exists.
    #[error("referenced row is missing: {0}")]
    MissingReference(String),
}

impl StoreError {
    /// Classifies a driver error, splitting out foreign key violations.
    pub fn from_write(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::MissingReference(db.message().to_string())
            }
            other => StoreError::Sqlx(other),
        }
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: NewJob) -> Result<JobRow, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<JobRow>, StoreError>;
    /// Full replacement of the writable fields. `None` if the job does not exist.
    async fn update(&self, id: Uuid, job: NewJob) -> Result<Option<JobRow>, StoreError>;
    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn exists(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Bulk lookup in one round trip. Unknown ids are absent from the result;
    /// order is unspecified.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<JobRow>, StoreError>;
    /// Newest first. `page` starts at 1.
    async fn search(
        &self,
        criteria: &JobSearch,
        page: u32,
        limit: u32,
    ) -> Result<Vec<JobRow>, StoreError>;
}

#[async_trait]
pub trait CvStore: Send + Sync {
    async fn create(&self, cv: NewCv) -> Result<CvRow, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<CvRow>, StoreError>;
    /// The owner's CV with the latest `uploaded_at`.
    async fn find_latest_by_owner(&self, user_id: Uuid) -> Result<Option<CvRow>, StoreError>;
}

#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Atomic insert-or-update keyed on (user, job, type).
    async fn upsert(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        interaction_type: InteractionType,
        notes: Option<String>,
    ) -> Result<Interaction, StoreError>;
    /// Newest first, optionally filtered by type.
    async fn list(
        &self,
        user_id: Uuid,
        interaction_type: Option<InteractionType>,
    ) -> Result<Vec<Interaction>, StoreError>;
    /// Returns whether a row was deleted.
    async fn delete(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        interaction_type: InteractionType,
    ) -> Result<bool, StoreError>;
}

/// Offset for 1-based pages.
pub(crate) fn page_offset(page: u32, limit: u32) -> i64 {
    i64::from(page.max(1) - 1) * i64::from(limit)
}
