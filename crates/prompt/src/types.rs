//! Prompt types for LabChat.

use serde::{Deserialize, Serialize};

/// A prompt definition: a domain agent's system prompt template.
///
/// Definitions ship built in (see [`crate::catalog`]) and can be overridden
/// by a YAML file in the workspace for prompt tuning without recompiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier (e.g., "agent.chembl")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Template string with Handlebars syntax
    pub template: String,
}

impl PromptDefinition {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            template: template.into(),
        }
    }
}
