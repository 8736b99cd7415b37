use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{page_offset, JobStore, StoreError};
use crate::models::job::{JobRow, JobSearch, NewJob};

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job: NewJob) -> Result<JobRow, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs
                (id, title, company_name, location, industry, position, salary_range,
                 required_experience, required_degree, image_url, skills_required,
                 job_description, posted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.company_name)
        .bind(&job.location)
        .bind(&job.industry)
        .bind(&job.position)
        .bind(&job.salary_range)
        .bind(&job.required_experience)
        .bind(&job.required_degree)
        .bind(&job.image_url)
        .bind(&job.skills_required)
        .bind(&job.job_description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update(&self, id: Uuid, job: NewJob) -> Result<Option<JobRow>, StoreError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs SET
                title = $2, company_name = $3, location = $4, industry = $5,
                position = $6, salary_range = $7, required_experience = $8,
                required_degree = $9, image_url = $10, skills_required = $11,
                job_description = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&job.title)
        .bind(&job.company_name)
        .bind(&job.location)
        .bind(&job.industry)
        .bind(&job.position)
        .bind(&job.salary_range)
        .bind(&job.required_experience)
        .bind(&job.required_degree)
        .bind(&job.image_url)
        .bind(&job.skills_required)
        .bind(&job.job_description)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM jobs WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<JobRow>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(
            sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ANY($1)")
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn search(
        &self,
        criteria: &JobSearch,
        page: u32,
        limit: u32,
    ) -> Result<Vec<JobRow>, StoreError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE ($1::text IS NULL
                   OR title ILIKE $1 ESCAPE '\'
                   OR job_description ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR location ILIKE $2 ESCAPE '\')
              AND ($3::text IS NULL OR industry = $3)
              AND ($4::text IS NULL OR salary_range = $4)
              AND ($5::text IS NULL OR required_experience = $5)
              AND skills_required @> $6::text[]
            ORDER BY posted_at DESC, id
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(non_blank(&criteria.keyword).map(contains_pattern))
        .bind(non_blank(&criteria.location).map(contains_pattern))
        .bind(non_blank(&criteria.industry))
        .bind(non_blank(&criteria.salary_range))
        .bind(non_blank(&criteria.experience_level))
        .bind(&criteria.skills)
        .bind(i64::from(limit))
        .bind(page_offset(page, limit))
        .fetch_all(&self.pool)
        .await?)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `ILIKE` substring pattern with the user's `%`, `_` and `\` matched literally.
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
