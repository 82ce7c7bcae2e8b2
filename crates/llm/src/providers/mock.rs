//! Mock model provider for tests and offline development.
//!
//! Converse replies are scripted in order; embeddings are deterministic,
//! content-dependent vectors (word hashing), so the same text always maps
//! to the same vector. Not semantically meaningful, but stable enough for
//! pipeline tests.

use crate::client::{ConverseRequest, ConverseResponse, ModelClient, TokenUsage};
use labchat_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted mock provider.
pub struct MockClient {
    dimensions: usize,
    replies: Mutex<VecDeque<ConverseResponse>>,
    requests: Mutex<Vec<ConverseRequest>>,
}

impl MockClient {
    /// Create a mock with the given embedding dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain-text reply.
    pub fn push_text_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(ConverseResponse {
            text: text.into(),
            tool_calls: Vec::new(),
            usage: TokenUsage::new(1, 1),
        });
    }

    /// Queue an arbitrary reply (e.g., with tool calls).
    pub fn push_reply(&self, reply: ConverseResponse) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<ConverseRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for word in text.to_lowercase().split_whitespace() {
            let mut hash: u64 = 5381;
            for b in word.bytes() {
                hash = hash.wrapping_mul(33).wrapping_add(b as u64);
            }
            let idx = (hash as usize) % self.dimensions;
            embedding[idx] += 1.0;
        }

        // L2-normalize so scores stay comparable
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl ModelClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn converse(&self, request: &ConverseRequest) -> AppResult<ConverseResponse> {
        self.requests.lock().unwrap().push(request.clone());

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Llm("Mock provider has no scripted reply".to_string()))
    }

    async fn embed(&self, _model: &str, text: &str) -> AppResult<Vec<f32>> {
        Ok(self.generate_embedding(text))
    }
}
