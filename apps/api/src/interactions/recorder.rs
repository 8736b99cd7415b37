use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interactions::validation::{normalize_notes, parse_interaction_type};
use crate::models::interaction::{Interaction, InteractionWithJob};
use crate::models::job::JobRow;
use crate::store::{InteractionStore, JobStore, StoreError};

/// Records, lists and removes user interactions with jobs.
///
/// No application-level locking: convergence of concurrent identical
/// `record` calls relies on the store's atomic upsert.
pub struct InteractionRecorder {
    interactions: Arc<dyn InteractionStore>,
    jobs: Arc<dyn JobStore>,
}

impl InteractionRecorder {
    pub fn new(interactions: Arc<dyn InteractionStore>, jobs: Arc<dyn JobStore>) -> Self {
        Self { interactions, jobs }
    }

    /// Validates the type and the job, then upserts on (user, job, type).
    /// Re-recording replaces notes and timestamp.
    pub async fn record(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        interaction_type: &str,
        notes: Option<String>,
    ) -> Result<Interaction, AppError> {
        let interaction_type = parse_interaction_type(interaction_type)?;
        let notes = normalize_notes(notes)?;

        if !self.jobs.exists(job_id).await? {
            return Err(AppError::JobNotFound(job_id.to_string()));
        }

        // The job can disappear between the check and the write.
        let interaction = self
            .interactions
            .upsert(user_id, job_id, interaction_type, notes)
            .await
            .map_err(|e| match e {
                StoreError::MissingReference(_) => AppError::JobNotFound(job_id.to_string()),
                other => AppError::from(other),
            })?;
        debug!("Recorded {interaction_type} of job {job_id} by user {user_id}");
        Ok(interaction)
    }

    /// Newest first, each hydrated with its job in one bulk read.
    pub async fn list(
        &self,
        user_id: Uuid,
        interaction_type: Option<&str>,
    ) -> Result<Vec<InteractionWithJob>, AppError> {
        let interaction_type = interaction_type.map(parse_interaction_type).transpose()?;
        let interactions = self.interactions.list(user_id, interaction_type).await?;
        if interactions.is_empty() {
            return Ok(Vec::new());
        }

        let mut job_ids: Vec<Uuid> = interactions.iter().map(|i| i.job_id).collect();
        job_ids.sort();
        job_ids.dedup();
        let jobs: HashMap<Uuid, JobRow> = self
            .jobs
            .find_many(&job_ids)
            .await?
            .into_iter()
            .map(|j| (j.id, j))
            .collect();

        Ok(interactions
            .into_iter()
            .filter_map(|interaction| match jobs.get(&interaction.job_id) {
                Some(job) => Some(InteractionWithJob {
                    job: job.clone(),
                    interaction,
                }),
                None => {
                    warn!(
                        "Interaction {} references missing job {}",
                        interaction.id, interaction.job_id
                    );
                    None
                }
            })
            .collect())
    }

    /// Removing an interaction that does not exist is a successful no-op.
    pub async fn remove(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        interaction_type: &str,
    ) -> Result<(), AppError> {
        let interaction_type = parse_interaction_type(interaction_type)?;
        let removed = self
            .interactions
            .delete(user_id, job_id, interaction_type)
            .await?;
        debug!("Remove {interaction_type} of job {job_id} by user {user_id}: removed={removed}");
        Ok(())
    }
}
