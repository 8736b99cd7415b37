use crate::models::job::JobRow;

/// The exact text handed to the embedding service for a domain entity.
///
/// Derived deterministically from the entity so that re-indexing the same
/// record always embeds the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSource(String);

impl EmbeddingSource {
    /// Title, description and skills, one block per line. Blank parts are skipped.
    pub fn from_job(job: &JobRow) -> Self {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        let title = job.title.trim();
        if !title.is_empty() {
            parts.push(title.to_string());
        }
        let description = job.job_description.trim();
        if !description.is_empty() {
            parts.push(description.to_string());
        }
        let skills: Vec<&str> = job
            .skills_required
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !skills.is_empty() {
            parts.push(format!("Skills: {}", skills.join(", ")));
        }
        Self(parts.join("\n"))
    }

    /// The extracted CV text, or a format placeholder when nothing was extracted.
    pub fn from_cv(extracted_text: &str, source_format: &str) -> Self {
        let text = extracted_text.trim();
        if text.is_empty() {
            Self(format!("Curriculum vitae ({source_format})"))
        } else {
            Self(text.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
