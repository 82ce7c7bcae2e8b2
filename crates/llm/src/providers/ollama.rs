//! Ollama model provider.
//!
//! Local runtime used for development without cloud credentials.
//! Chat goes through `/api/chat` (which supports tool calling) and
//! embeddings through `/api/embeddings`.

use crate::client::{ConverseRequest, ConverseResponse, Message, ModelClient, Role, TokenUsage, ToolCall};
use labchat_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Ollama embeddings API response.
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

/// Ollama client.
pub struct OllamaClient {
    /// Base URL for the Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with the default endpoint.
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434")
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Convert a ConverseRequest to the Ollama chat body.
    fn to_chat_body(&self, request: &ConverseRequest) -> serde_json::Value {
        let mut messages: Vec<serde_json::Value> = Vec::new();

        if let Some(ref system) = request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }

        for m in &request.messages {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::Tool => "tool",
            };
            messages.push(json!({ "role": role, "content": m.content }));
        }

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": request.params.temperature,
                "top_p": request.params.top_p,
                "num_predict": request.params.max_tokens,
                "stop": request.stop_sequences,
            },
        });

        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.input_schema,
                        }
                    })
                })
                .collect();
            body["tools"] = json!(tools);
        }

        body
    }

    fn convert_response(&self, response: OllamaChatResponse) -> ConverseResponse {
        let tool_calls = response
            .message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, tc)| ToolCall {
                // Ollama does not assign call ids; synthesize stable ones
                id: format!("call-{}", i),
                name: tc.function.name,
                input: tc.function.arguments,
            })
            .collect();

        ConverseResponse {
            text: response.message.content,
            tool_calls,
            usage: TokenUsage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ModelClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn converse(&self, request: &ConverseRequest) -> AppResult<ConverseResponse> {
        tracing::info!("Sending chat request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let body = self.to_chat_body(request);
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(self.convert_response(chat_response))
    }

    async fn embed(&self, model: &str, text: &str) -> AppResult<Vec<f32>> {
        let body = json!({ "model": model, "prompt": text });
        let url = format!("{}/api/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send embedding request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let embed_response: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse embedding response: {}", e)))?;

        Ok(embed_response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ConverseRequest;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_chat_body_includes_system_first() {
        let client = OllamaClient::new();
        let request = ConverseRequest::new("llama3", "hi").with_system("be terse");
        let body = client.to_chat_body(&request);

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_tool_call_ids_are_synthesized() {
        let client = OllamaClient::new();
        let raw: OllamaChatResponse = serde_json::from_value(serde_json::json!({
            "message": {
                "content": "",
                "tool_calls": [
                    { "function": { "name": "a", "arguments": {} } },
                    { "function": { "name": "b", "arguments": {} } }
                ]
            }
        }))
        .unwrap();

        let converted = client.convert_response(raw);
        assert_eq!(converted.tool_calls[0].id, "call-0");
        assert_eq!(converted.tool_calls[1].id, "call-1");
    }
}
