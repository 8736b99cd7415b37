use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A job listing. Read-only input from the recommender's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub industry: String,
    pub position: Option<String>,
    pub salary_range: Option<String>,
    pub required_experience: Option<String>,
    pub required_degree: Option<String>,
    pub image_url: Option<String>,
    pub skills_required: Vec<String>,
    pub job_description: String,
    pub posted_at: DateTime<Utc>,
}

/// Writable job fields, used for both create and full update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub industry: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub required_experience: Option<String>,
    #[serde(default)]
    pub required_degree: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub job_description: String,
}

/// Optional filters for catalogue search. Empty fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearch {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    /// Exact match on `salary_range`.
    pub salary_range: Option<String>,
    /// Exact match on `required_experience`.
    pub experience_level: Option<String>,
    /// Every listed skill must be required by the job.
    #[serde(default)]
    pub skills: Vec<String>,
}
