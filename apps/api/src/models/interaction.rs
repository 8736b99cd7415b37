use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::models::job::JobRow;

/// What a user did with a job. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Viewed,
    Saved,
    Applied,
}

impl InteractionType {
    pub const ALL: [InteractionType; 3] = [
        InteractionType::Viewed,
        InteractionType::Saved,
        InteractionType::Applied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Viewed => "viewed",
            InteractionType::Saved => "saved",
            InteractionType::Applied => "applied",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown interaction type '{0}'")]
pub struct UnknownInteractionType(pub String);

impl FromStr for InteractionType {
    type Err = UnknownInteractionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InteractionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownInteractionType(s.to_string()))
    }
}

/// Raw database row; `interaction_type` is stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct InteractionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub interaction_type: String,
    pub notes: Option<String>,
    pub interaction_time: DateTime<Utc>,
}

/// A recorded user action against a job, unique per (user, job, type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub interaction_type: InteractionType,
    pub notes: Option<String>,
    pub interaction_time: DateTime<Utc>,
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = UnknownInteractionType;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        Ok(Interaction {
            id: row.id,
            user_id: row.user_id,
            job_id: row.job_id,
            interaction_type: row.interaction_type.parse()?,
            notes: row.notes,
            interaction_time: row.interaction_time,
        })
    }
}

/// An interaction hydrated with its job, for activity views.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionWithJob {
    pub interaction: Interaction,
    pub job: JobRow,
}
