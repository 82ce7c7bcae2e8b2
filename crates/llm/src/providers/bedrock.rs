//! Managed cloud model provider (Bedrock runtime REST API).
//!
//! Talks to the Bedrock runtime over HTTPS with an API key: `converse`
//! for chat (with tool use) and `invoke` for Titan text embeddings.
//! Transient failures are retried with bounded exponential backoff,
//! mirroring the adaptive retry policy of the deployed proof-of-concept.

use crate::client::{ConverseRequest, ConverseResponse, Message, ModelClient, Role, TokenUsage, ToolCall};
use labchat_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Initial backoff delay between retry attempts.
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Bedrock converse API response.
#[derive(Debug, Deserialize)]
struct BedrockConverseResponse {
    output: BedrockOutput,
    #[serde(default)]
    usage: Option<BedrockUsage>,
}

#[derive(Debug, Deserialize)]
struct BedrockOutput {
    message: BedrockMessage,
}

#[derive(Debug, Deserialize)]
struct BedrockMessage {
    #[serde(default)]
    content: Vec<BedrockContentBlock>,
}

#[derive(Debug, Deserialize)]
struct BedrockContentBlock {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "toolUse", default)]
    tool_use: Option<BedrockToolUse>,
}

#[derive(Debug, Deserialize)]
struct BedrockToolUse {
    #[serde(rename = "toolUseId")]
    tool_use_id: String,
    name: String,
    input: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct BedrockUsage {
    #[serde(rename = "inputTokens", default)]
    input_tokens: u32,
    #[serde(rename = "outputTokens", default)]
    output_tokens: u32,
}

/// Titan embedding response.
#[derive(Debug, Deserialize)]
struct TitanEmbedResponse {
    embedding: Vec<f32>,
}

/// Bedrock runtime client.
pub struct BedrockClient {
    /// Base URL, e.g. "https://bedrock-runtime.us-west-2.amazonaws.com"
    base_url: String,

    /// API key sent as a bearer token
    api_key: String,

    /// Maximum attempts for transient failures
    max_attempts: u32,

    /// HTTP client
    client: reqwest::Client,
}

impl BedrockClient {
    /// Create a client for a region with service-default timeouts.
    pub fn new(region: &str, api_key: impl Into<String>) -> AppResult<Self> {
        Self::builder(region, api_key).build()
    }

    /// Start building a client with explicit timeouts and retry policy.
    pub fn builder(region: &str, api_key: impl Into<String>) -> BedrockClientBuilder {
        BedrockClientBuilder {
            base_url: format!("https://bedrock-runtime.{}.amazonaws.com", region),
            api_key: api_key.into(),
            connect_timeout: Duration::from_secs(900),
            read_timeout: Duration::from_secs(900),
            max_attempts: 3,
        }
    }

    /// Create a client against an arbitrary endpoint (used in tests).
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> AppResult<Self> {
        let mut builder = Self::builder("us-west-2", api_key);
        builder.base_url = base_url.into();
        builder.build()
    }

    /// Convert a ConverseRequest into the Bedrock converse body.
    fn to_bedrock_body(&self, request: &ConverseRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| Self::to_bedrock_message(m))
            .collect();

        let mut body = json!({
            "messages": messages,
            "inferenceConfig": {
                "maxTokens": request.params.max_tokens,
                "temperature": request.params.temperature,
                "topP": request.params.top_p,
                "stopSequences": request.stop_sequences,
            },
        });

        if let Some(ref system) = request.system {
            body["system"] = json!([{ "text": system }]);
        }

        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "toolSpec": {
                            "name": t.name,
                            "description": t.description,
                            "inputSchema": { "json": t.input_schema },
                        }
                    })
                })
                .collect();
            body["toolConfig"] = json!({ "tools": tools });
        }

        body
    }

    fn to_bedrock_message(message: &Message) -> serde_json::Value {
        match message.role {
            Role::User => json!({
                "role": "user",
                "content": [{ "text": message.content }],
            }),
            Role::Assistant => json!({
                "role": "assistant",
                "content": [{ "text": message.content }],
            }),
            // Tool results go back as user-role toolResult blocks
            Role::Tool => json!({
                "role": "user",
                "content": [{
                    "toolResult": {
                        "toolUseId": message.tool_call_id.clone().unwrap_or_default(),
                        "content": [{ "text": message.content }],
                    }
                }],
            }),
        }
    }

    /// Convert the Bedrock response into a ConverseResponse.
    fn convert_response(&self, response: BedrockConverseResponse) -> ConverseResponse {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in response.output.message.content {
            if let Some(t) = block.text {
                text.push_str(&t);
            }
            if let Some(tu) = block.tool_use {
                tool_calls.push(ToolCall {
                    id: tu.tool_use_id,
                    name: tu.name,
                    input: tu.input,
                });
            }
        }

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        ConverseResponse {
            text,
            tool_calls,
            usage,
        }
    }

    /// POST a JSON body, retrying transient failures with backoff.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> AppResult<reqwest::Response> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retryable = status.as_u16() == 429 || status.is_server_error();

                    if retryable && attempt < self.max_attempts {
                        let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                        tracing::warn!(
                            "Model service returned {} (attempt {}/{}), retrying in {}ms",
                            status,
                            attempt,
                            self.max_attempts,
                            delay
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        continue;
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(AppError::Llm(format!(
                        "Model service error ({}): {}",
                        status, error_text
                    )));
                }
                Err(e) => {
                    if attempt < self.max_attempts {
                        let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                        tracing::warn!(
                            "Request failed (attempt {}/{}): {}, retrying in {}ms",
                            attempt,
                            self.max_attempts,
                            e,
                            delay
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        continue;
                    }
                    return Err(AppError::Llm(format!("Failed to reach model service: {}", e)));
                }
            }
        }
    }
}

/// Builder for [`BedrockClient`].
pub struct BedrockClientBuilder {
    base_url: String,
    api_key: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_attempts: u32,
}

impl BedrockClientBuilder {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn build(self) -> AppResult<BedrockClient> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.read_timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(BedrockClient {
            base_url: self.base_url,
            api_key: self.api_key,
            max_attempts: self.max_attempts,
            client,
        })
    }
}

#[async_trait::async_trait]
impl ModelClient for BedrockClient {
    fn provider_name(&self) -> &str {
        "bedrock"
    }

    async fn converse(&self, request: &ConverseRequest) -> AppResult<ConverseResponse> {
        tracing::info!("Sending converse request to model '{}'", request.model);
        tracing::debug!("Messages: {}, tools: {}", request.messages.len(), request.tools.len());

        let body = self.to_bedrock_body(request);
        let url = format!("{}/model/{}/converse", self.base_url, request.model);

        let response = self.post_json(&url, &body).await?;

        let bedrock_response: BedrockConverseResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse converse response: {}", e)))?;

        let converted = self.convert_response(bedrock_response);
        tracing::info!(
            "Received response ({} chars, {} tool calls)",
            converted.text.len(),
            converted.tool_calls.len()
        );

        Ok(converted)
    }

    async fn embed(&self, model: &str, text: &str) -> AppResult<Vec<f32>> {
        tracing::debug!("Embedding {} chars with '{}'", text.len(), model);

        let body = json!({ "inputText": text });
        let url = format!("{}/model/{}/invoke", self.base_url, model);

        let response = self.post_json(&url, &body).await?;

        let titan_response: TitanEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse embedding response: {}", e)))?;

        if titan_response.embedding.is_empty() {
            return Err(AppError::Llm("Embedding response was empty".to_string()));
        }

        Ok(titan_response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labchat_core::GenerationParams;

    fn test_client() -> BedrockClient {
        BedrockClient::new("us-west-2", "test-key").unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = test_client();
        assert_eq!(client.provider_name(), "bedrock");
        assert_eq!(
            client.base_url,
            "https://bedrock-runtime.us-west-2.amazonaws.com"
        );
    }

    #[test]
    fn test_converse_body_shape() {
        let client = test_client();
        let request = ConverseRequest::new("model-a", "hello")
            .with_system("be brief")
            .with_params(GenerationParams::factual())
            .with_stop_sequences(vec!["\n\nHuman:".to_string()]);

        let body = client.to_bedrock_body(&request);

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "hello");
        assert_eq!(body["system"][0]["text"], "be brief");
        assert_eq!(body["inferenceConfig"]["maxTokens"], 1024);
        assert_eq!(body["inferenceConfig"]["stopSequences"][0], "\n\nHuman:");
        assert!(body.get("toolConfig").is_none());
    }

    #[test]
    fn test_tool_result_message_encoding() {
        let msg = Message::tool_result("tool-1", "result text");
        let encoded = BedrockClient::to_bedrock_message(&msg);

        assert_eq!(encoded["role"], "user");
        assert_eq!(
            encoded["content"][0]["toolResult"]["toolUseId"],
            "tool-1"
        );
    }

    #[test]
    fn test_response_conversion_with_tool_use() {
        let client = test_client();
        let raw: BedrockConverseResponse = serde_json::from_value(serde_json::json!({
            "output": {
                "message": {
                    "role": "assistant",
                    "content": [
                        { "text": "Searching ChEMBL." },
                        { "toolUse": {
                            "toolUseId": "t-1",
                            "name": "search_compound",
                            "input": { "name": "imatinib" }
                        }}
                    ]
                }
            },
            "usage": { "inputTokens": 20, "outputTokens": 8, "totalTokens": 28 }
        }))
        .unwrap();

        let converted = client.convert_response(raw);
        assert_eq!(converted.text, "Searching ChEMBL.");
        assert_eq!(converted.tool_calls.len(), 1);
        assert_eq!(converted.tool_calls[0].name, "search_compound");
        assert_eq!(converted.usage.total_tokens, 28);
        assert!(!converted.is_final());
    }
}
