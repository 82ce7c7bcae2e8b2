//! Command handlers for the LabChat CLI.

pub mod agent;
pub mod chat;
pub mod domains;
pub mod kb;

// Re-export command types for convenience
pub use agent::AgentCommand;
pub use chat::ChatCommand;
pub use domains::DomainsCommand;
pub use kb::KbCommand;
