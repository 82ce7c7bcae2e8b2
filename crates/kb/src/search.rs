//! Vector search client.
//!
//! Sends a query vector to the managed k-nearest-neighbour index and maps
//! the raw hits into [`CandidateHit`]s. The trait seam exists so the
//! answering pipeline can substitute a scripted index in tests.

use crate::types::CandidateHit;
use labchat_core::{AppError, AppResult, SearchConfig};
use serde_json::json;

/// Trait for vector index queries.
#[async_trait::async_trait]
pub trait VectorSearch: Send + Sync {
    /// Query the index with a vector, returning up to `k` scored hits.
    async fn knn(&self, vector: &[f32], k: usize) -> AppResult<Vec<CandidateHit>>;
}

/// OpenSearch-compatible kNN client.
pub struct OpenSearchClient {
    /// Base URL including scheme, e.g. "https://collection-host"
    base_url: String,

    /// Index and document field names
    config: SearchConfig,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenSearchClient {
    /// Create a client from the search configuration.
    pub fn new(config: &SearchConfig) -> Self {
        let base_url = if config.host.starts_with("http://") || config.host.starts_with("https://")
        {
            config.host.clone()
        } else {
            format!("https://{}", config.host)
        };

        Self {
            base_url,
            config: config.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the kNN query body.
    fn knn_body(&self, vector: &[f32], k: usize) -> serde_json::Value {
        // The vector field name is configuration, so the knn clause is
        // assembled as a map rather than written literally.
        let mut knn = serde_json::Map::new();
        knn.insert(
            self.config.vector_field.clone(),
            json!({ "vector": vector, "k": k }),
        );

        json!({
            "size": k,
            "query": { "knn": knn }
        })
    }

    /// Map the raw search response into candidate hits.
    ///
    /// Passage text comes from the configured text field; the source is
    /// the configured source-URI field, falling back to the document id.
    fn parse_hits(&self, response: &serde_json::Value) -> AppResult<Vec<CandidateHit>> {
        let raw_hits = response["hits"]["hits"].as_array().ok_or_else(|| {
            AppError::Search("Malformed search response: missing hits.hits".to_string())
        })?;

        let mut hits = Vec::with_capacity(raw_hits.len());

        for raw in raw_hits {
            let score = raw["_score"].as_f64().unwrap_or(0.0) as f32;

            let text = raw["_source"][&self.config.text_field]
                .as_str()
                .unwrap_or("")
                .trim()
                .to_string();

            let source = raw["_source"][&self.config.source_field]
                .as_str()
                .or_else(|| raw["_id"].as_str())
                .unwrap_or("")
                .to_string();

            hits.push(CandidateHit::new(score, text, source));
        }

        Ok(hits)
    }
}

#[async_trait::async_trait]
impl VectorSearch for OpenSearchClient {
    async fn knn(&self, vector: &[f32], k: usize) -> AppResult<Vec<CandidateHit>> {
        tracing::debug!("kNN query against '{}' (k={})", self.config.index, k);

        let url = format!("{}/{}/_search", self.base_url, self.config.index);
        let body = self.knn_body(vector, k);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to query vector index: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Search(format!(
                "Vector index error ({}): {}",
                status, error_text
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))?;

        let hits = self.parse_hits(&value)?;
        tracing::info!("Vector index returned {} hits", hits.len());

        Ok(hits)
    }
}
