//! Domain agent crate for LabChat.
//!
//! Each biomedical database (ChEMBL, UniProt, Open Targets, ...) gets a
//! dedicated agent: a system prompt from the catalog, a tool server
//! spoken to over MCP stdio, and the shared converse/tool loop. The
//! sliding-window conversation keeps multi-turn sessions bounded, and
//! the log relay streams progress while an agent works.

pub mod agent;
pub mod conversation;
pub mod mcp;
pub mod relay;
pub mod servers;

// Re-export main types
pub use agent::{DomainAgent, ToolBackend};
pub use conversation::SlidingWindowConversation;
pub use mcp::{McpClient, ServerParameters};
pub use relay::LogRelay;
pub use servers::server_for;
