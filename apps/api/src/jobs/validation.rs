use crate::errors::AppError;
use crate::models::job::NewJob;

/// Checks required fields and normalises a job before it is written.
///
/// Required: title, company_name, location, industry. Skills are trimmed and
/// de-duplicated case-insensitively, keeping the first spelling.
pub fn validate_new_job(mut job: NewJob) -> Result<NewJob, AppError> {
    let required = [
        ("title", &mut job.title),
        ("company_name", &mut job.company_name),
        ("location", &mut job.location),
        ("industry", &mut job.industry),
    ];
    for (name, value) in required {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput(format!("{name} is required")));
        }
        *value = trimmed.to_string();
    }
    job.job_description = job.job_description.trim().to_string();

    let mut seen = std::collections::HashSet::new();
    job.skills_required = job
        .skills_required
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect();

    Ok(job)
}
