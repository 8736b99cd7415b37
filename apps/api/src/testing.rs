//! In-memory fakes of the external seams, shared by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::embedding::{ensure_non_empty, Embedder, Embedding, EmbeddingError};
use crate::errors::AppError;
use crate::models::cv::{CvRow, NewCv};
use crate::models::interaction::{Interaction, InteractionType};
use crate::models::job::{JobRow, JobSearch, NewJob};
use crate::storage::CvArchive;
use crate::store::{page_offset, CvStore, InteractionStore, JobStore, StoreError};
use crate::vector_index::{ensure_top_k, IndexError, Namespace, ScoredId, VectorIndex, VectorRecord};

const HASH_DIMENSIONS: usize = 1024;

// ─── Embedder ────────────────────────────────────────────────────────────────

/// Deterministic bag-of-words embedder: lowercase alphanumeric tokens hashed
/// (FNV-1a) into a fixed number of buckets, L2-normalised.
#[derive(Default)]
pub struct HashingEmbedder {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl HashingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// While set, every call fails as if the service returned 503.
    pub fn fail_next_calls(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        ensure_non_empty(text)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Api {
                status: 503,
                message: "embedding service unavailable".to_string(),
            });
        }

        let mut vector = vec![0.0f32; HASH_DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % HASH_DIMENSIONS as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

// ─── Vector index ────────────────────────────────────────────────────────────

type Stored = (Embedding, BTreeMap<String, String>);

#[derive(Default)]
pub struct InMemoryVectorIndex {
    vectors: Mutex<HashMap<(Namespace, String), Stored>>,
    failing_writes: AtomicBool,
}

impl InMemoryVectorIndex {
    pub fn fail_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self, ns: Namespace) -> usize {
        let vectors = self.vectors.lock().unwrap();
        vectors.keys().filter(|(n, _)| *n == ns).count()
    }

    pub fn metadata(&self, ns: Namespace, id: &str) -> Option<BTreeMap<String, String>> {
        let vectors = self.vectors.lock().unwrap();
        vectors.get(&(ns, id.to_string())).map(|(_, m)| m.clone())
    }

    fn check_writable(&self) -> Result<(), IndexError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(IndexError::Write("index unavailable".to_string()));
        }
        Ok(())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert_batch(&self, ns: Namespace, records: &[VectorRecord]) -> Result<(), IndexError> {
        self.check_writable()?;
        let mut vectors = self.vectors.lock().unwrap();
        for record in records {
            vectors.insert(
                (ns, record.id.clone()),
                (record.values.clone(), record.metadata.clone()),
            );
        }
        Ok(())
    }

    async fn query(
        &self,
        ns: Namespace,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredId>, IndexError> {
        ensure_top_k(top_k)?;
        let vectors = self.vectors.lock().unwrap();
        let mut scored: Vec<ScoredId> = vectors
            .iter()
            .filter(|((n, _), _)| *n == ns)
            .map(|((_, id), (values, _))| ScoredId {
                id: id.clone(),
                score: cosine(vector, values),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn fetch(&self, ns: Namespace, id: &str) -> Result<Option<Embedding>, IndexError> {
        let vectors = self.vectors.lock().unwrap();
        Ok(vectors.get(&(ns, id.to_string())).map(|(v, _)| v.clone()))
    }

    async fn delete(&self, ns: Namespace, id: &str) -> Result<(), IndexError> {
        self.check_writable()?;
        self.vectors.lock().unwrap().remove(&(ns, id.to_string()));
        Ok(())
    }
}

// ─── Stores ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<Uuid, JobRow>>,
}

impl InMemoryJobStore {
    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn filter_value(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn matches_search(job: &JobRow, criteria: &JobSearch) -> bool {
    let keyword = filter_value(&criteria.keyword)
        .map_or(true, |k| contains_ci(&job.title, k) || contains_ci(&job.job_description, k));
    let location = filter_value(&criteria.location).map_or(true, |l| contains_ci(&job.location, l));
    let industry = filter_value(&criteria.industry).map_or(true, |i| job.industry == i);
    let salary = filter_value(&criteria.salary_range)
        .map_or(true, |s| job.salary_range.as_deref() == Some(s));
    let experience = filter_value(&criteria.experience_level)
        .map_or(true, |e| job.required_experience.as_deref() == Some(e));
    let skills = criteria.skills.iter().all(|s| job.skills_required.contains(s));
    keyword && location && industry && salary && experience && skills
}

fn apply(id: Uuid, job: NewJob, posted_at: chrono::DateTime<Utc>) -> JobRow {
    JobRow {
        id,
        title: job.title,
        company_name: job.company_name,
        location: job.location,
        industry: job.industry,
        position: job.position,
        salary_range: job.salary_range,
        required_experience: job.required_experience,
        required_degree: job.required_degree,
        image_url: job.image_url,
        skills_required: job.skills_required,
        job_description: job.job_description,
        posted_at,
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: NewJob) -> Result<JobRow, StoreError> {
        let row = apply(Uuid::new_v4(), job, Utc::now());
        self.jobs.lock().unwrap().insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobRow>, StoreError> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, id: Uuid, job: NewJob) -> Result<Option<JobRow>, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(existing) = jobs.get_mut(&id) else {
            return Ok(None);
        };
        *existing = apply(id, job, existing.posted_at);
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.jobs.lock().unwrap().remove(&id).is_some())
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.jobs.lock().unwrap().contains_key(&id))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<JobRow>, StoreError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(ids.iter().filter_map(|id| jobs.get(id).cloned()).collect())
    }

    async fn search(
        &self,
        criteria: &JobSearch,
        page: u32,
        limit: u32,
    ) -> Result<Vec<JobRow>, StoreError> {
        let jobs = self.jobs.lock().unwrap();
        let mut found: Vec<JobRow> = jobs
            .values()
            .filter(|job| matches_search(job, criteria))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found
            .into_iter()
            .skip(page_offset(page, limit) as usize)
            .take(limit as usize)
            .collect())
    }
}

/// CV rows plus an insertion sequence so same-instant uploads still have a
/// well-defined latest.
#[derive(Default)]
pub struct InMemoryCvStore {
    cvs: Mutex<Vec<(u64, CvRow)>>,
    seq: AtomicU64,
}

impl InMemoryCvStore {
    pub fn len(&self) -> usize {
        self.cvs.lock().unwrap().len()
    }
}

#[async_trait]
impl CvStore for InMemoryCvStore {
    async fn create(&self, cv: NewCv) -> Result<CvRow, StoreError> {
        let row = CvRow {
            id: Uuid::new_v4(),
            user_id: cv.user_id,
            source_format: cv.source_format,
            extracted_text: cv.extracted_text,
            file_key: cv.file_key,
            embedding: cv.embedding,
            uploaded_at: Utc::now(),
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.cvs.lock().unwrap().push((seq, row.clone()));
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CvRow>, StoreError> {
        let cvs = self.cvs.lock().unwrap();
        Ok(cvs.iter().find(|(_, cv)| cv.id == id).map(|(_, cv)| cv.clone()))
    }

    async fn find_latest_by_owner(&self, user_id: Uuid) -> Result<Option<CvRow>, StoreError> {
        let cvs = self.cvs.lock().unwrap();
        Ok(cvs
            .iter()
            .filter(|(_, cv)| cv.user_id == user_id)
            .max_by(|(sa, a), (sb, b)| a.uploaded_at.cmp(&b.uploaded_at).then(sa.cmp(sb)))
            .map(|(_, cv)| cv.clone()))
    }
}

type InteractionKey = (Uuid, Uuid, InteractionType);

/// Keyed on (user, job, type) under one lock, so upserts are atomic the same
/// way the unique index makes them atomic in Postgres.
#[derive(Default)]
pub struct InMemoryInteractionStore {
    rows: Mutex<HashMap<InteractionKey, (u64, Interaction)>>,
    seq: AtomicU64,
    missing_job: AtomicBool,
}

impl InMemoryInteractionStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// While set, upserts fail the way a foreign key violation on `job_id` does.
    pub fn reject_writes_as_missing_job(&self, rejecting: bool) {
        self.missing_job.store(rejecting, Ordering::SeqCst);
    }
}

#[async_trait]
impl InteractionStore for InMemoryInteractionStore {
    async fn upsert(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        interaction_type: InteractionType,
        notes: Option<String>,
    ) -> Result<Interaction, StoreError> {
        if self.missing_job.load(Ordering::SeqCst) {
            return Err(StoreError::MissingReference(format!(
                "interactions.job_id {job_id} not present in jobs"
            )));
        }
        let mut rows = self.rows.lock().unwrap();
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let id = rows
            .get(&(user_id, job_id, interaction_type))
            .map_or_else(Uuid::new_v4, |(_, existing)| existing.id);
        let interaction = Interaction {
            id,
            user_id,
            job_id,
            interaction_type,
            notes,
            interaction_time: Utc::now(),
        };
        rows.insert(
            (user_id, job_id, interaction_type),
            (seq, interaction.clone()),
        );
        Ok(interaction)
    }

    async fn list(
        &self,
        user_id: Uuid,
        interaction_type: Option<InteractionType>,
    ) -> Result<Vec<Interaction>, StoreError> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<&(u64, Interaction)> = rows
            .values()
            .filter(|(_, i)| i.user_id == user_id)
            .filter(|(_, i)| interaction_type.map_or(true, |t| i.interaction_type == t))
            .collect();
        found.sort_by(|(sa, a), (sb, b)| {
            b.interaction_time
                .cmp(&a.interaction_time)
                .then(sb.cmp(sa))
        });
        Ok(found.into_iter().map(|(_, i)| i.clone()).collect())
    }

    async fn delete(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        interaction_type: InteractionType,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.remove(&(user_id, job_id, interaction_type)).is_some())
    }
}

// ─── Archive ─────────────────────────────────────────────────────────────────

/// Records archived keys; optionally fails every write.
#[derive(Default)]
pub struct InMemoryArchive {
    keys: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl InMemoryArchive {
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl CvArchive for InMemoryArchive {
    async fn store(&self, key: &str, _bytes: Bytes, _content_type: &str) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Storage("bucket unavailable".to_string()));
        }
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.keys.lock().unwrap().retain(|k| k != key);
        Ok(())
    }
}

// ─── Builders ────────────────────────────────────────────────────────────────

pub fn new_job(title: &str, description: &str, skills: &[&str]) -> NewJob {
    NewJob {
        title: title.to_string(),
        company_name: "Acme".to_string(),
        location: "Remote".to_string(),
        industry: "Technology".to_string(),
        skills_required: skills.iter().map(|s| s.to_string()).collect(),
        job_description: description.to_string(),
        ..Default::default()
    }
}

/// A minimal DOCX container whose body holds one paragraph per entry.
pub fn docx_fixture(paragraphs: &[&str]) -> Bytes {
    use std::io::Write;

    let body: String = paragraphs
        .iter()
        .map(|p| {
            format!(
                "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                quick_xml::escape::escape(*p)
            )
        })
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    Bytes::from(writer.finish().unwrap().into_inner())
}

pub fn job_row(title: &str, description: &str, skills: &[&str]) -> JobRow {
    apply(Uuid::new_v4(), new_job(title, description, skills), Utc::now())
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/jobmatch_test".to_string(),
        db_max_connections: 1,
        embedding_service_url: "http://localhost:9".to_string(),
        vector_index_url: "http://localhost:9".to_string(),
        vector_index_api_key: "test".to_string(),
        s3_bucket: "cvs".to_string(),
        s3_endpoint: "http://localhost:9".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        http_timeout_secs: 1,
        default_top_k: 10,
        max_upload_bytes: 1024 * 1024,
        port: 0,
        rust_log: "debug".to_string(),
    }
}
