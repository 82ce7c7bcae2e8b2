//! Model client abstraction and request/response types.
//!
//! This module defines the core abstractions for talking to a managed
//! model service: multi-turn conversation with optional tool use, and
//! text embedding.

use labchat_core::{AppResult, GenerationParams};
use serde::{Deserialize, Serialize};

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// A tool invocation result fed back to the model
    Tool,
}

/// A single conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    pub content: String,

    /// Set when `role` is `Tool`: the id of the tool call being answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Description of a tool the model may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,

    pub description: String,

    /// JSON schema for the tool input
    pub input_schema: serde_json::Value,
}

/// A tool call proposed by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    pub name: String,

    pub input: serde_json::Value,
}

/// Conversation request against a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverseRequest {
    /// Model identifier (e.g., an inference profile id)
    pub model: String,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Conversation history, oldest first
    pub messages: Vec<Message>,

    /// Tools the model may call (empty = plain chat)
    #[serde(default)]
    pub tools: Vec<ToolSpec>,

    /// Sampling parameters
    pub params: GenerationParams,

    /// Sequences that stop generation
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

impl ConverseRequest {
    /// Create a plain single-question request with factual sampling.
    pub fn new(model: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages: vec![Message::user(question)],
            tools: Vec::new(),
            params: GenerationParams::factual(),
            stop_sequences: Vec::new(),
        }
    }

    /// Replace the message history.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Offer tools to the model.
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the sampling parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Set stop sequences.
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = stop_sequences;
        self
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u32,

    #[serde(default)]
    pub output_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Model response: generated text and/or proposed tool calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverseResponse {
    /// Generated text (may be empty when the model only calls tools)
    pub text: String,

    /// Tool calls the model wants executed before it can answer
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Usage statistics
    #[serde(default)]
    pub usage: TokenUsage,
}

impl ConverseResponse {
    /// Whether the model is done (no pending tool calls).
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Trait for model providers.
///
/// Abstracts the managed model service (or a local runtime) behind a
/// unified conversation + embedding interface so the knowledge-base and
/// agent pipelines can substitute providers in tests.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Get the provider name (e.g., "bedrock", "ollama").
    fn provider_name(&self) -> &str;

    /// Run one conversation turn.
    async fn converse(&self, request: &ConverseRequest) -> AppResult<ConverseResponse>;

    /// Embed a text into a fixed-length vector.
    async fn embed(&self, model: &str, text: &str) -> AppResult<Vec<f32>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ConverseRequest::new("model-x", "What is imatinib?")
            .with_system("You are a research assistant.")
            .with_stop_sequences(vec!["\n\nHuman:".to_string()]);

        assert_eq!(request.model, "model-x");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.system.as_deref(), Some("You are a research assistant."));
        assert_eq!(request.stop_sequences, vec!["\n\nHuman:".to_string()]);
    }

    #[test]
    fn test_tool_result_message() {
        let msg = Message::tool_result("call-1", "{\"smiles\":\"CC\"}");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call-1"));
    }

    #[test]
    fn test_response_finality() {
        let done = ConverseResponse {
            text: "answer".to_string(),
            tool_calls: vec![],
            usage: TokenUsage::new(10, 5),
        };
        assert!(done.is_final());
        assert_eq!(done.usage.total_tokens, 15);

        let pending = ConverseResponse {
            text: String::new(),
            tool_calls: vec![ToolCall {
                id: "1".to_string(),
                name: "search".to_string(),
                input: serde_json::json!({}),
            }],
            usage: TokenUsage::default(),
        };
        assert!(!pending.is_final());
    }
}
