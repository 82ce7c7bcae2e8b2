//! Model integration crate for LabChat.
//!
//! Provider-agnostic abstraction over the model services the application
//! talks to: multi-turn conversation (with tool use) and text embedding.
//!
//! # Providers
//! - **Bedrock**: managed cloud runtime (default in deployments)
//! - **Ollama**: local runtime for development
//! - **Mock**: scripted provider for tests
//!
//! # Example
//! ```no_run
//! use labchat_llm::{ConverseRequest, ModelClient, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ConverseRequest::new("llama3", "What inhibits BCR-ABL?");
//! let response = client.converse(&request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    ConverseRequest, ConverseResponse, Message, ModelClient, Role, TokenUsage, ToolCall, ToolSpec,
};
pub use factory::create_client;
pub use providers::{BedrockClient, MockClient, OllamaClient};
