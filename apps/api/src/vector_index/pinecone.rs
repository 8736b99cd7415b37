//! HTTP adapter for a Pinecone-compatible data plane.
//!
//! Endpoints: `POST /vectors/upsert`, `POST /query`, `GET /vectors/fetch`,
//! `POST /vectors/delete`, authenticated with the `Api-Key` header.
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ensure_top_k, IndexError, Namespace, ScoredId, VectorIndex, VectorRecord};
use crate::embedding::Embedding;

/// Largest batch sent in one upsert request.
const MAX_UPSERT_BATCH: usize = 100;

#[derive(Debug, Serialize)]
struct WireVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<WireVector<'a>>,
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_values: bool,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredId>,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, FetchedVector>,
}

#[derive(Debug, Deserialize)]
struct FetchedVector {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: [&'a str; 1],
    namespace: &'a str,
}

#[derive(Clone)]
pub struct PineconeIndex {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PineconeIndex {
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Returns the response on 2xx, otherwise a message with status and body.
async fn check_status(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(format!("status {}: {}", status.as_u16(), body))
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert_batch(
        &self,
        ns: Namespace,
        records: &[VectorRecord],
    ) -> Result<(), IndexError> {
        for chunk in records.chunks(MAX_UPSERT_BATCH) {
            let request = UpsertRequest {
                vectors: chunk
                    .iter()
                    .map(|r| WireVector {
                        id: &r.id,
                        values: &r.values,
                        metadata: &r.metadata,
                    })
                    .collect(),
                namespace: ns.as_str(),
            };

            let response = self
                .client
                .post(self.url("/vectors/upsert"))
                .header("Api-Key", &self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| IndexError::Write(e.to_string()))?;
            let response = check_status(response).await.map_err(IndexError::Write)?;

            let parsed: UpsertResponse = response
                .json()
                .await
                .map_err(|e| IndexError::Write(format!("malformed upsert response: {e}")))?;
            if let Some(count) = parsed.upserted_count {
                if count != chunk.len() {
                    return Err(IndexError::Write(format!(
                        "partial upsert: {count} of {} vectors written",
                        chunk.len()
                    )));
                }
            }
        }

        debug!("Upserted {} vectors into '{}'", records.len(), ns.as_str());
        Ok(())
    }

    async fn query(
        &self,
        ns: Namespace,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredId>, IndexError> {
        ensure_top_k(top_k)?;

        let request = QueryRequest {
            vector,
            top_k,
            namespace: ns.as_str(),
            include_values: false,
            include_metadata: false,
        };

        let response = self
            .client
            .post(self.url("/query"))
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IndexError::Query(e.to_string()))?;
        let response = check_status(response).await.map_err(IndexError::Query)?;

        let mut parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Query(format!("malformed query response: {e}")))?;
        parsed.matches.truncate(top_k);
        Ok(parsed.matches)
    }

    async fn fetch(&self, ns: Namespace, id: &str) -> Result<Option<Embedding>, IndexError> {
        let response = self
            .client
            .get(self.url("/vectors/fetch"))
            .header("Api-Key", &self.api_key)
            .query(&[("ids", id), ("namespace", ns.as_str())])
            .send()
            .await
            .map_err(|e| IndexError::Query(e.to_string()))?;
        let response = check_status(response).await.map_err(IndexError::Query)?;

        let mut parsed: FetchResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Query(format!("malformed fetch response: {e}")))?;
        Ok(parsed.vectors.remove(id).map(|v| v.values))
    }

    async fn delete(&self, ns: Namespace, id: &str) -> Result<(), IndexError> {
        let response = self
            .client
            .post(self.url("/vectors/delete"))
            .header("Api-Key", &self.api_key)
            .json(&DeleteRequest {
                ids: [id],
                namespace: ns.as_str(),
            })
            .send()
            .await
            .map_err(|e| IndexError::Write(e.to_string()))?;
        check_status(response).await.map_err(IndexError::Write)?;
        Ok(())
    }
}
