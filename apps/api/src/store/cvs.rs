use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CvStore, StoreError};
use crate::models::cv::{CvRow, NewCv};

#[derive(Clone)]
pub struct PgCvStore {
    pool: PgPool,
}

impl PgCvStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CvStore for PgCvStore {
    async fn create(&self, cv: NewCv) -> Result<CvRow, StoreError> {
        Ok(sqlx::query_as::<_, CvRow>(
            r#"
            INSERT INTO cvs
                (id, user_id, source_format, extracted_text, file_key, embedding, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(cv.user_id)
        .bind(&cv.source_format)
        .bind(&cv.extracted_text)
        .bind(&cv.file_key)
        .bind(&cv.embedding)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CvRow>, StoreError> {
        Ok(sqlx::query_as::<_, CvRow>("SELECT * FROM cvs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_latest_by_owner(&self, user_id: Uuid) -> Result<Option<CvRow>, StoreError> {
        Ok(sqlx::query_as::<_, CvRow>(
            "SELECT * FROM cvs WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
