//! Prompt system for LabChat.
//!
//! Holds the built-in system prompts for the biomedical domain agents,
//! the knowledge-base generation template (with the service-substituted
//! `$search_results$` placeholder), and Handlebars rendering for
//! workspace prompt overrides.

pub mod builder;
pub mod catalog;
pub mod types;

pub use builder::{build_prompt, render_template};
pub use catalog::{
    builtin, builtin_ids, load_prompt, CHITCHAT_SYSTEM, DIFFICULTY_MARKER, KB_ANSWER_TEMPLATE,
};
pub use types::PromptDefinition;
