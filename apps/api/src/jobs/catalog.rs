use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::embedding::{Embedder, EmbeddingSource};
use crate::errors::AppError;
use crate::jobs::validation::validate_new_job;
use crate::models::job::{JobRow, JobSearch, NewJob};
use crate::store::JobStore;
use crate::vector_index::{Namespace, VectorIndex};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Index metadata for a job vector.
pub fn job_metadata(job: &JobRow) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("kind".to_string(), "job".to_string()),
        ("job_id".to_string(), job.id.to_string()),
        ("title".to_string(), job.title.clone()),
        ("industry".to_string(), job.industry.clone()),
        ("location".to_string(), job.location.clone()),
    ])
}

pub struct JobCatalog {
    jobs: Arc<dyn JobStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl JobCatalog {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            jobs,
            index,
            embedder,
        }
    }

    /// Persists a job and indexes its embedding source.
    ///
    /// If indexing fails the job stays in the store and the error is returned;
    /// `jobmatch reindex-jobs` will pick it up.
    pub async fn create(&self, job: NewJob) -> Result<JobRow, AppError> {
        let job = validate_new_job(job)?;
        let job = self.jobs.create(job).await?;
        self.index_job(&job).await?;
        info!("Created and indexed job {} ({})", job.id, job.title);
        Ok(job)
    }

    pub async fn update(&self, id: Uuid, job: NewJob) -> Result<JobRow, AppError> {
        let job = validate_new_job(job)?;
        let job = self
            .jobs
            .update(id, job)
            .await?
            .ok_or_else(|| AppError::JobNotFound(id.to_string()))?;
        self.index_job(&job).await?;
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<JobRow, AppError> {
        self.jobs
            .get(id)
            .await?
            .ok_or_else(|| AppError::JobNotFound(id.to_string()))
    }

    /// Deletes the record, then its vector. A failed vector delete is only
    /// logged: hydration already drops ids missing from the store.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.jobs.delete(id).await? {
            return Err(AppError::JobNotFound(id.to_string()));
        }
        if let Err(e) = self.index.delete(Namespace::Jobs, &id.to_string()).await {
            warn!("Job {id} deleted but its vector was not: {e}");
        }
        Ok(())
    }

    pub async fn search(
        &self,
        criteria: &JobSearch,
        page: u32,
        limit: u32,
    ) -> Result<Vec<JobRow>, AppError> {
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(self.jobs.search(criteria, page.max(1), limit).await?)
    }

    async fn index_job(&self, job: &JobRow) -> Result<(), AppError> {
        let source = EmbeddingSource::from_job(job);
        let vector = self.embedder.embed(source.as_str()).await?;
        self.index
            .upsert(Namespace::Jobs, &job.id.to_string(), vector, job_metadata(job))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_job, HashingEmbedder, InMemoryJobStore, InMemoryVectorIndex};

    fn catalog() -> (JobCatalog, Arc<InMemoryJobStore>, Arc<InMemoryVectorIndex>) {
        let jobs = Arc::new(InMemoryJobStore::default());
        let index = Arc::new(InMemoryVectorIndex::default());
        let catalog = JobCatalog::new(
            jobs.clone(),
            index.clone(),
            Arc::new(HashingEmbedder::default()),
        );
        (catalog, jobs, index)
    }

    #[tokio::test]
    async fn test_create_indexes_job_with_metadata() {
        let (catalog, _jobs, index) = catalog();
        let job = catalog
            .create(new_job("Backend Engineer (Go)", "APIs", &["Go"]))
            .await
            .unwrap();

        let metadata = index.metadata(Namespace::Jobs, &job.id.to_string()).unwrap();
        assert_eq!(metadata.get("job_id"), Some(&job.id.to_string()));
        assert_eq!(metadata.get("title").map(String::as_str), Some("Backend Engineer (Go)"));
    }

    #[tokio::test]
    async fn test_create_validates_first() {
        let (catalog, jobs, index) = catalog();
        let err = catalog.create(new_job("", "APIs", &[])).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(jobs.len(), 0);
        assert_eq!(index.len(Namespace::Jobs), 0);
    }

    #[tokio::test]
    async fn test_update_reindexes() {
        let (catalog, _jobs, index) = catalog();
        let job = catalog.create(new_job("Chef", "Cook", &[])).await.unwrap();
        let before = index.fetch(Namespace::Jobs, &job.id.to_string()).await.unwrap();

        catalog
            .update(job.id, new_job("Rust Engineer", "Systems", &["rust"]))
            .await
            .unwrap();
        let after = index.fetch(Namespace::Jobs, &job.id.to_string()).await.unwrap();
        assert_ne!(before, after);
        assert_eq!(index.len(Namespace::Jobs), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_vector() {
        let (catalog, _jobs, index) = catalog();
        let job = catalog.create(new_job("Chef", "Cook", &[])).await.unwrap();

        catalog.delete(job.id).await.unwrap();
        assert!(matches!(catalog.get(job.id).await, Err(AppError::JobNotFound(_))));
        assert_eq!(index.len(Namespace::Jobs), 0);
        assert!(matches!(
            catalog.delete(job.id).await,
            Err(AppError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_validates_limit() {
        let (catalog, _jobs, _index) = catalog();
        let criteria = JobSearch::default();
        assert!(catalog.search(&criteria, 1, 0).await.is_err());
        assert!(catalog.search(&criteria, 1, MAX_PAGE_SIZE + 1).await.is_err());
        assert!(catalog.search(&criteria, 1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_filters_and_pages() {
        let (catalog, _jobs, _index) = catalog();
        for i in 0..3 {
            catalog
                .create(new_job(&format!("Rust Engineer {i}"), "Systems", &["rust"]))
                .await
                .unwrap();
        }
        catalog.create(new_job("Chef", "Cook", &["baking"])).await.unwrap();

        let criteria = JobSearch {
            keyword: Some("rust".into()),
            ..Default::default()
        };
        assert_eq!(catalog.search(&criteria, 1, 10).await.unwrap().len(), 3);
        assert_eq!(catalog.search(&criteria, 2, 2).await.unwrap().len(), 1);

        let by_skill = JobSearch {
            skills: vec!["baking".into()],
            ..Default::default()
        };
        let found = catalog.search(&by_skill, 1, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Chef");
    }

    #[tokio::test]
    async fn test_search_by_salary_range_and_experience_level() {
        let (catalog, _jobs, _index) = catalog();
        let mut senior = new_job("Senior Engineer", "Lead", &["rust"]);
        senior.salary_range = Some("100k-150k".into());
        senior.required_experience = Some("5+ years".into());
        let mut junior = new_job("Junior Engineer", "Learn", &["rust"]);
        junior.salary_range = Some("40k-60k".into());
        junior.required_experience = Some("0-2 years".into());
        catalog.create(senior).await.unwrap();
        catalog.create(junior).await.unwrap();

        let by_salary = JobSearch {
            salary_range: Some("100k-150k".into()),
            ..Default::default()
        };
        let found = catalog.search(&by_salary, 1, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Senior Engineer");

        let by_experience = JobSearch {
            experience_level: Some("0-2 years".into()),
            ..Default::default()
        };
        let found = catalog.search(&by_experience, 1, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Junior Engineer");

        let no_match = JobSearch {
            salary_range: Some("100k-150k".into()),
            experience_level: Some("0-2 years".into()),
            ..Default::default()
        };
        assert!(catalog.search(&no_match, 1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_requires_every_listed_skill() {
        let (catalog, _jobs, _index) = catalog();
        catalog
            .create(new_job("Platform Engineer", "Infra", &["go", "kubernetes"]))
            .await
            .unwrap();
        catalog.create(new_job("Go Developer", "APIs", &["go"])).await.unwrap();

        let both = JobSearch {
            skills: vec!["go".into(), "kubernetes".into()],
            ..Default::default()
        };
        let found = catalog.search(&both, 1, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Platform Engineer");

        let go_only = JobSearch {
            skills: vec!["go".into()],
            ..Default::default()
        };
        assert_eq!(catalog.search(&go_only, 1, 10).await.unwrap().len(), 2);
    }
}
