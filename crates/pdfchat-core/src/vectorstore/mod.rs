//! Namespace-partitioned vector store client
//!
//! Talks to an external hosted vector database over its JSON API.
//! Every vector carries exactly one namespace; retrieval is always
//! scoped to a single namespace, which is what isolates one uploaded
//! document from another.

use crate::config::VectorStoreConfig;
use crate::error::{PdfChatError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A vector plus its chunk text and page metadata, ready for upsert
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub text: String,
    pub page: usize,
}

/// One retrieved chunk with its similarity score (higher is more similar)
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub text: String,
    pub score: f32,
}

/// Vector store operations used by ingestion and retrieval
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert records under the given namespace
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Query the namespace for the top-k nearest neighbors,
    /// ordered by descending similarity score
    async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertRequest {
    vectors: Vec<UpsertVector>,
    namespace: String,
}

#[derive(Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    namespace: String,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    score: f32,
    #[serde(default)]
    metadata: Value,
}

/// HTTP client for a hosted vector database
pub struct HttpVectorStore {
    http_client: reqwest::Client,
    config: VectorStoreConfig,
}

impl HttpVectorStore {
    /// Create new client from configuration
    pub fn new(config: VectorStoreConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(PdfChatError::Http)?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(VectorStoreConfig::default())
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            req.header("Api-Key", api_key)
        } else {
            req
        }
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()> {
        let request = UpsertRequest {
            vectors: records
                .into_iter()
                .map(|r| UpsertVector {
                    id: r.id,
                    values: r.values,
                    metadata: serde_json::json!({ "text": r.text, "page": r.page }),
                })
                .collect(),
            namespace: namespace.to_string(),
        };

        let url = format!("{}/vectors/upsert", self.config.url);
        let req = self.authorize(self.http_client.post(&url).json(&request));

        let response = req.send().await.map_err(PdfChatError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PdfChatError::VectorStore(format!(
                "Upsert failed (HTTP {}): {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let request = QueryRequest {
            vector,
            top_k,
            namespace: namespace.to_string(),
            include_metadata: true,
        };

        let url = format!("{}/query", self.config.url);
        let req = self.authorize(self.http_client.post(&url).json(&request));

        let response = req.send().await.map_err(PdfChatError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PdfChatError::VectorStore(format!(
                "Query failed (HTTP {}): {}",
                status, body
            )));
        }

        let query_response: QueryResponse = response.json().await.map_err(PdfChatError::Http)?;

        Ok(results_from_matches(query_response.matches))
    }
}

/// Convert raw matches to results, sorted by descending score
fn results_from_matches(matches: Vec<QueryMatch>) -> Vec<RetrievalResult> {
    let mut results: Vec<RetrievalResult> = matches
        .into_iter()
        .map(|m| RetrievalResult {
            text: m.metadata["text"].as_str().unwrap_or_default().to_string(),
            score: m.score,
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    results
}
