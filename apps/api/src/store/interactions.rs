use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{InteractionStore, StoreError};
use crate::models::interaction::{Interaction, InteractionRow, InteractionType};

#[derive(Clone)]
pub struct PgInteractionStore {
    pool: PgPool,
}

impl PgInteractionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_interaction(row: InteractionRow) -> Result<Interaction, StoreError> {
    Interaction::try_from(row).map_err(|e| StoreError::InvalidValue(e.to_string()))
}

#[async_trait]
impl InteractionStore for PgInteractionStore {
    async fn upsert(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        interaction_type: InteractionType,
        notes: Option<String>,
    ) -> Result<Interaction, StoreError> {
        // Single statement: concurrent identical calls converge on the unique index.
        let row = sqlx::query_as::<_, InteractionRow>(
            r#"
            INSERT INTO interactions (id, user_id, job_id, interaction_type, notes, interaction_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, job_id, interaction_type)
            DO UPDATE SET notes = EXCLUDED.notes, interaction_time = EXCLUDED.interaction_time
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(job_id)
        .bind(interaction_type.as_str())
        .bind(notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_write)?;
        into_interaction(row)
    }

    async fn list(
        &self,
        user_id: Uuid,
        interaction_type: Option<InteractionType>,
    ) -> Result<Vec<Interaction>, StoreError> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            r#"
            SELECT * FROM interactions
            WHERE user_id = $1 AND ($2::text IS NULL OR interaction_type = $2)
            ORDER BY interaction_time DESC, id
            "#,
        )
        .bind(user_id)
        .bind(interaction_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(into_interaction).collect()
    }

    async fn delete(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        interaction_type: InteractionType,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM interactions WHERE user_id = $1 AND job_id = $2 AND interaction_type = $3",
        )
        .bind(user_id)
        .bind(job_id)
        .bind(interaction_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
