//! Prompt rendering via Handlebars.

use crate::types::PromptDefinition;
use handlebars::Handlebars;
use labchat_core::{AppError, AppResult};
use std::collections::HashMap;

/// Render a prompt definition with the given variables.
///
/// Built-in templates usually have no variables, but overrides may use
/// Handlebars syntax (e.g., `{{tools}}` for a rendered tool list).
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    tracing::debug!("Building prompt: {}", definition.id);
    render_template(&definition.template, variables)
}

/// Render a Handlebars template with variables.
pub fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text prompts
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
