//! Full-corpus job re-embedding, run as `jobmatch reindex-jobs`.
//!
//! Idempotent: vectors are upserted by job id. Per-job embedding failures and
//! failed batch writes are counted, logged and skipped.

use serde::Serialize;
use tracing::{info, warn};

use crate::embedding::{Embedder, EmbeddingSource};
use crate::jobs::catalog::job_metadata;
use crate::models::job::JobSearch;
use crate::store::{JobStore, StoreError};
use crate::vector_index::{Namespace, VectorIndex, VectorRecord};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    pub indexed: usize,
    pub failed: usize,
}

pub async fn reindex_jobs(
    jobs: &dyn JobStore,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    batch_size: u32,
) -> Result<ReindexReport, StoreError> {
    let batch_size = batch_size.max(1);
    let criteria = JobSearch::default();
    let mut report = ReindexReport::default();
    let mut page = 1;

    loop {
        let batch = jobs.search(&criteria, page, batch_size).await?;
        if batch.is_empty() {
            break;
        }

        let mut records = Vec::with_capacity(batch.len());
        for job in &batch {
            let source = EmbeddingSource::from_job(job);
            match embedder.embed(source.as_str()).await {
                Ok(values) => records.push(VectorRecord {
                    id: job.id.to_string(),
                    values,
                    metadata: job_metadata(job),
                }),
                Err(e) => {
                    warn!("Skipping job {} ({}): {e}", job.id, job.title);
                    report.failed += 1;
                }
            }
        }

        if !records.is_empty() {
            match index.upsert_batch(Namespace::Jobs, &records).await {
                Ok(()) => report.indexed += records.len(),
                Err(e) => {
                    warn!("Batch {page} of {} vectors failed: {e}", records.len());
                    report.failed += records.len();
                }
            }
        }

        info!(
            "Reindex page {page}: {} indexed, {} failed so far",
            report.indexed, report.failed
        );
        if (batch.len() as u32) < batch_size {
            break;
        }
        page += 1;
    }

    Ok(report)
}
