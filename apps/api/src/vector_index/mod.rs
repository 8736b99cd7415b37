//! Vector index adapter: upsert, similarity query and fetch against the
//! external vector store.
//!
//! CV and job vectors live in separate namespaces so a job query never
//! returns CV vectors. No caching: every call is a round trip.
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::Embedding;

pub mod pinecone;

pub use pinecone::PineconeIndex;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(usize),

    #[error("index write failed: {0}")]
    Write(String),

    #[error("index query failed: {0}")]
    Query(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Cvs,
    Jobs,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Cvs => "cvs",
            Namespace::Jobs => "jobs",
        }
    }
}

/// A vector plus the metadata needed to map it back to its domain entity.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Embedding,
    pub metadata: BTreeMap<String, String>,
}

/// One similarity match, as returned by the index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredId {
    pub id: String,
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Writes every record or fails the whole call. Existing ids are overwritten.
    async fn upsert_batch(&self, ns: Namespace, records: &[VectorRecord])
        -> Result<(), IndexError>;

    /// At most `top_k` matches, best first.
    async fn query(
        &self,
        ns: Namespace,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredId>, IndexError>;

    /// `Ok(None)` when the id is not stored.
    async fn fetch(&self, ns: Namespace, id: &str) -> Result<Option<Embedding>, IndexError>;

    async fn delete(&self, ns: Namespace, id: &str) -> Result<(), IndexError>;

    async fn upsert(
        &self,
        ns: Namespace,
        id: &str,
        values: Embedding,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), IndexError> {
        let record = VectorRecord {
            id: id.to_string(),
            values,
            metadata,
        };
        self.upsert_batch(ns, std::slice::from_ref(&record)).await
    }
}

pub fn ensure_top_k(top_k: usize) -> Result<(), IndexError> {
    if top_k == 0 {
        return Err(IndexError::InvalidTopK(top_k));
    }
    Ok(())
}
