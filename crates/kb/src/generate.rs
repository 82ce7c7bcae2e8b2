//! Answer generation via the managed retrieve-and-generate service.
//!
//! The admitted evidence is re-packaged as a single external-sources byte
//! payload, so the generation step sees exactly the passages the hit
//! filter admitted and has no independent access to the index.

use labchat_core::{AppError, AppResult, GenerationParams};
use serde_json::json;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// A generation request carrying the filtered evidence.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// The user question
    pub question: String,

    /// Evidence blob: tagged passages joined with separators
    pub evidence: String,

    /// Payload identifier, e.g. "knn-top3"
    pub identifier: String,

    /// Prompt template containing the literal `$search_results$`
    /// placeholder the service substitutes
    pub template: String,

    /// Sampling parameters
    pub params: GenerationParams,

    /// Model identifier or inference-profile ARN
    pub model: String,
}

/// Trait for the retrieve-and-generate service.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer grounded in the supplied evidence.
    async fn generate(&self, request: &GenerateRequest) -> AppResult<String>;
}

/// HTTPS client for the Bedrock agent-runtime retrieveAndGenerate API.
pub struct RetrieveGenerateClient {
    /// Base URL, e.g. "https://bedrock-agent-runtime.us-west-2.amazonaws.com"
    base_url: String,

    /// API key sent as a bearer token
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl RetrieveGenerateClient {
    /// Create a client for a region.
    pub fn new(region: &str, api_key: impl Into<String>) -> Self {
        Self {
            base_url: format!("https://bedrock-agent-runtime.{}.amazonaws.com", region),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client against an arbitrary endpoint (used in tests).
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the external-sources request body.
    ///
    /// The service accepts exactly one byte-content source, so the whole
    /// evidence blob travels as a single base64 payload.
    fn request_body(&self, request: &GenerateRequest) -> serde_json::Value {
        let data = BASE64.encode(request.evidence.as_bytes());

        json!({
            "input": { "text": request.question },
            "retrieveAndGenerateConfiguration": {
                "type": "EXTERNAL_SOURCES",
                "externalSourcesConfiguration": {
                    "modelArn": request.model,
                    "sources": [{
                        "sourceType": "BYTE_CONTENT",
                        "byteContent": {
                            "contentType": "text/plain",
                            "data": data,
                            "identifier": request.identifier,
                        }
                    }],
                    "generationConfiguration": {
                        "promptTemplate": {
                            "textPromptTemplate": request.template,
                        },
                        "inferenceConfig": {
                            "textInferenceConfig": {
                                "temperature": request.params.temperature,
                                "topP": request.params.top_p,
                                "maxTokens": request.params.max_tokens,
                            }
                        }
                    }
                }
            }
        })
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for RetrieveGenerateClient {
    async fn generate(&self, request: &GenerateRequest) -> AppResult<String> {
        tracing::info!(
            "Sending retrieve-and-generate request ({} evidence bytes)",
            request.evidence.len()
        );

        let url = format!("{}/retrieveAndGenerate", self.base_url);
        let body = self.request_body(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Knowledge(format!(
                "Generation service error ({}): {}",
                status, error_text
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse generation response: {}", e)))?;

        let answer = value["output"]["text"].as_str().ok_or_else(|| {
            AppError::Knowledge("Generation response had no output text".to_string())
        })?;

        Ok(answer.to_string())
    }
}
