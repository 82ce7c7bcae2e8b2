//! Difficulty / citation gate.
//!
//! The generation template pins an exact refusal sentence for questions
//! the evidence cannot answer. When that marker appears in the generated
//! text, the answer is treated as coming from general knowledge and the
//! source links are suppressed.

use labchat_prompt::DIFFICULTY_MARKER;

/// Whether citations must be suppressed for this generated answer.
pub fn suppress_citations(answer: &str) -> bool {
    answer.contains(DIFFICULTY_MARKER)
}
