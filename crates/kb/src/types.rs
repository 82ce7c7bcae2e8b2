//! Knowledge-base answering types.

use serde::{Deserialize, Serialize};

/// A scored candidate passage returned by the vector index.
///
/// Produced per query, immutable, discarded after one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateHit {
    /// Relevance score from the index
    pub score: f32,

    /// Passage text
    pub text: String,

    /// Source document URI or opaque id
    pub source: String,
}

impl CandidateHit {
    pub fn new(score: f32, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            score,
            text: text.into(),
            source: source.into(),
        }
    }
}

/// Routing decision for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Greeting / small talk: skip retrieval entirely
    ChitChat,

    /// Retrieval ran but no candidate survived admission: answer
    /// conversationally, without citations
    Fallback,

    /// Answer from the admitted evidence passages
    Evidence(Vec<CandidateHit>),
}

/// Final answer returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbAnswer {
    /// Natural-language answer text
    pub answer: String,

    /// De-duplicated source URLs backing the answer; empty when the
    /// answer was not grounded in evidence
    pub sources: Vec<String>,

    /// Whether the evidence path produced this answer
    pub from_evidence: bool,
}

impl KbAnswer {
    /// An answer with no citations (chit-chat or fallback path).
    pub fn unsourced(answer: String) -> Self {
        Self {
            answer,
            sources: Vec::new(),
            from_evidence: false,
        }
    }

    /// An evidence-grounded answer with its source URLs.
    pub fn cited(answer: String, sources: Vec<String>) -> Self {
        Self {
            answer,
            sources,
            from_evidence: true,
        }
    }
}
