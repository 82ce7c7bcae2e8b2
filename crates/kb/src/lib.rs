//! Knowledge-base answering crate for LabChat.
//!
//! Turns one biomedical question into a cited answer: the router decides
//! whether retrieved passages are trustworthy enough to ground the
//! answer, the generator produces it against the packaged evidence, and
//! the citation gate withholds source URLs when the model reports it
//! could not use the documents.
//!
//! # Pipeline
//! 1. [`router::is_smalltalk`] short-circuits greetings
//! 2. [`search::VectorSearch`] retrieves scored candidate passages
//! 3. [`router::route`] admits or rejects each candidate
//! 4. [`generate::AnswerGenerator`] answers from the admitted evidence
//! 5. [`gate::suppress_citations`] decides citation visibility

pub mod ask;
pub mod gate;
pub mod generate;
pub mod router;
pub mod search;
pub mod sources;
pub mod types;

// Re-export main types
pub use ask::{ask, KbContext};
pub use generate::{AnswerGenerator, GenerateRequest, RetrieveGenerateClient};
pub use search::{OpenSearchClient, VectorSearch};
pub use types::{CandidateHit, KbAnswer, Route};
