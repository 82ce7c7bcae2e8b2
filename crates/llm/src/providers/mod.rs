//! Model provider implementations.

pub mod bedrock;
pub mod mock;
pub mod ollama;

pub use bedrock::BedrockClient;
pub use mock::MockClient;
pub use ollama::OllamaClient;
