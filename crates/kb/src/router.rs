//! Hit filter / router.
//!
//! Decides, per question, whether to skip retrieval (small talk), which
//! candidate passages are admissible evidence, and whether to answer from
//! evidence or fall back to open conversation. This is the one place in
//! the application with real branching logic; everything around it is
//! delegation to managed services.

use crate::types::{CandidateHit, Route};
use labchat_core::FilterThresholds;
use std::collections::HashSet;

/// Avoids division by zero in the top1/top2 margin ratio.
const SCORE_EPSILON: f32 = 1e-6;

/// Greeting / small-talk openers (English and Korean).
///
/// Matched as a prefix on the trimmed, lowercased question, with a word
/// boundary after the match so "hi" does not swallow "high affinity".
const SMALLTALK_PREFIXES: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "how are you",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
    "안녕",
    "안녕하세요",
    "반가워요",
    "고마워",
    "감사합니다",
];

/// Whether a question is a greeting or small talk.
///
/// Small talk bypasses retrieval entirely; the search client must never
/// be invoked for these questions.
pub fn is_smalltalk(question: &str) -> bool {
    let trimmed = question.trim().to_lowercase();
    if trimmed.is_empty() {
        return false;
    }

    SMALLTALK_PREFIXES.iter().any(|prefix| {
        if !trimmed.starts_with(prefix) {
            return false;
        }
        // Word boundary: end of input, or a non-token character next
        match trimmed[prefix.len()..].chars().next() {
            None => true,
            Some(c) => !is_token_char(c),
        }
    })
}

/// Token characters: ASCII alphanumerics and Hangul syllables.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Tokenize into a lowercase alphanumeric (Latin + Hangul) token set.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !is_token_char(c))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Token-set intersection size between question and passage.
pub fn token_overlap(question_tokens: &HashSet<String>, passage: &str) -> usize {
    let passage_tokens = tokenize(passage);
    question_tokens.intersection(&passage_tokens).count()
}

/// Whether the result set is sufficiently peaked on its best hit.
///
/// True when there is no second candidate, or when
/// `top1 / (top2 + epsilon) >= margin_min`.
pub fn margin_ok(hits: &[CandidateHit], margin_min: f32) -> bool {
    let mut top1 = f32::NEG_INFINITY;
    let mut top2 = f32::NEG_INFINITY;

    for hit in hits {
        if hit.score > top1 {
            top2 = top1;
            top1 = hit.score;
        } else if hit.score > top2 {
            top2 = hit.score;
        }
    }

    if top2 == f32::NEG_INFINITY {
        return true;
    }

    top1 / (top2 + SCORE_EPSILON) >= margin_min
}

/// Filter candidates down to admissible evidence.
///
/// Empty passages are dropped before the admission check. Each remaining
/// candidate is scored on four conditions (score, length, overlap,
/// margin) and admitted when at least two hold.
pub fn admit_hits(
    question: &str,
    hits: &[CandidateHit],
    thresholds: &FilterThresholds,
) -> Vec<CandidateHit> {
    let candidates: Vec<&CandidateHit> = hits
        .iter()
        .filter(|h| !h.text.trim().is_empty())
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    let owned: Vec<CandidateHit> = candidates.iter().map(|h| (*h).clone()).collect();
    let margin = margin_ok(&owned, thresholds.margin_min);
    let question_tokens = tokenize(question);

    let mut admitted = Vec::new();

    for hit in candidates {
        let overlap = token_overlap(&question_tokens, &hit.text);

        let mut passed = 0usize;
        if hit.score >= thresholds.min_score {
            passed += 1;
        }
        if hit.text.chars().count() >= thresholds.min_chars {
            passed += 1;
        }
        if overlap >= thresholds.overlap_min {
            passed += 1;
        }
        if margin {
            passed += 1;
        }

        tracing::debug!(
            score = hit.score,
            chars = hit.text.chars().count(),
            overlap,
            margin,
            passed,
            "hit admission check"
        );

        if passed >= 2 {
            admitted.push(hit.clone());
        }
    }

    admitted
}

/// Route a question given its retrieved candidates.
///
/// Small talk wins regardless of what the index returned. Callers still
/// check [`is_smalltalk`] before retrieval so the search client is never
/// invoked for greetings; this re-check makes the decision total for
/// callers that already hold candidates.
pub fn route(question: &str, hits: &[CandidateHit], thresholds: &FilterThresholds) -> Route {
    if is_smalltalk(question) {
        return Route::ChitChat;
    }

    if hits.is_empty() {
        return Route::Fallback;
    }

    let admitted = admit_hits(question, hits, thresholds);
    if admitted.is_empty() {
        tracing::info!("No candidate survived admission, falling back to open conversation");
        Route::Fallback
    } else {
        tracing::info!("Admitted {} of {} candidates as evidence", admitted.len(), hits.len());
        Route::Evidence(admitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> FilterThresholds {
        FilterThresholds::default()
    }

    fn long_text(prefix: &str) -> String {
        // Comfortably past the 160-char length threshold
        format!("{} {}", prefix, "x".repeat(200))
    }

    #[test]
    fn test_smalltalk_prefixes() {
        assert!(is_smalltalk("Hello there"));
        assert!(is_smalltalk("hi"));
        assert!(is_smalltalk("  Thanks!"));
        assert!(is_smalltalk("안녕하세요"));
        assert!(is_smalltalk("안녕, 뭐가 궁금해?"));
    }

    #[test]
    fn test_research_questions_are_not_smalltalk() {
        assert!(!is_smalltalk("high affinity BCR-ABL inhibitors"));
        assert!(!is_smalltalk("What is the mechanism of imatinib?"));
        assert!(!is_smalltalk("histone deacetylase inhibitors"));
        assert!(!is_smalltalk(""));
    }

    #[test]
    fn test_tokenize_latin_and_hangul() {
        let tokens = tokenize("Imatinib (Gleevec) 억제제, BCR-ABL!");
        assert!(tokens.contains("imatinib"));
        assert!(tokens.contains("gleevec"));
        assert!(tokens.contains("억제제"));
        assert!(tokens.contains("bcr"));
        assert!(tokens.contains("abl"));
    }

    #[test]
    fn test_token_overlap_shared_terms() {
        // At least {"imatinib"} is shared
        let question_tokens = tokenize("imatinib mechanism of action");
        let overlap = token_overlap(&question_tokens, "Imatinib inhibits BCR-ABL kinase");
        assert!(overlap >= 1);
    }

    #[test]
    fn test_margin_ok_wide_gap() {
        // 0.9 / 0.3 = 3.0 >= 1.05
        let hits = vec![
            CandidateHit::new(0.9, "a", "s1"),
            CandidateHit::new(0.3, "b", "s2"),
        ];
        assert!(margin_ok(&hits, 1.05));
    }

    #[test]
    fn test_margin_ok_single_candidate() {
        let hits = vec![CandidateHit::new(0.1, "a", "s1")];
        assert!(margin_ok(&hits, 1.05));
    }

    #[test]
    fn test_margin_not_ok_flat_scores() {
        let hits = vec![
            CandidateHit::new(0.50, "a", "s1"),
            CandidateHit::new(0.50, "b", "s2"),
        ];
        assert!(!margin_ok(&hits, 1.05));
    }

    #[test]
    fn test_admit_two_of_four_conditions() {
        // Good score + long passage, but no token overlap and flat margin:
        // exactly 2 of 4 conditions hold, so the hit is admitted.
        let hits = vec![
            CandidateHit::new(0.5, long_text("unrelated passage content entirely"), "s1"),
            CandidateHit::new(0.5, long_text("another unrelated passage body"), "s2"),
        ];

        let admitted = admit_hits("imatinib kinase selectivity", &hits, &thresholds());
        assert_eq!(admitted.len(), 2);
    }

    #[test]
    fn test_reject_one_of_four_conditions() {
        // Low score, short passage, no overlap, flat margin: only margin
        // could save it and margin is false, so nothing passes.
        let hits = vec![
            CandidateHit::new(0.1, "short".to_string(), "s1"),
            CandidateHit::new(0.1, "also short".to_string(), "s2"),
        ];

        let admitted = admit_hits("imatinib kinase selectivity", &hits, &thresholds());
        assert!(admitted.is_empty());
    }

    #[test]
    fn test_short_overlapping_single_hit_admitted() {
        // Single candidate: margin holds unconditionally; overlap of 3
        // question tokens makes it 2 of 4 despite low score and length.
        let hits = vec![CandidateHit::new(
            0.1,
            "imatinib kinase selectivity profile",
            "s1",
        )];

        let admitted = admit_hits("imatinib kinase selectivity", &hits, &thresholds());
        assert_eq!(admitted.len(), 1);
    }

    #[test]
    fn test_empty_passages_dropped_before_admission() {
        let hits = vec![
            CandidateHit::new(0.9, "", "s1"),
            CandidateHit::new(0.8, "   ", "s2"),
        ];

        let admitted = admit_hits("imatinib", &hits, &thresholds());
        assert!(admitted.is_empty());
        assert_eq!(route("imatinib", &hits, &thresholds()), Route::Fallback);
    }

    #[test]
    fn test_route_empty_candidates_falls_back() {
        assert_eq!(route("imatinib", &[], &thresholds()), Route::Fallback);
    }

    #[test]
    fn test_route_smalltalk_wins_over_strong_candidates() {
        let hits = vec![CandidateHit::new(
            0.95,
            long_text("hello is a common greeting in correspondence"),
            "s3://papers/etiquette.pdf",
        )];

        assert_eq!(route("Hello there", &hits, &thresholds()), Route::ChitChat);
        assert_eq!(route("안녕하세요", &[], &thresholds()), Route::ChitChat);
    }

    #[test]
    fn test_route_evidence_path() {
        let hits = vec![CandidateHit::new(
            0.9,
            long_text("imatinib inhibits the bcr abl kinase with nanomolar potency"),
            "s3://papers/imatinib.pdf",
        )];

        match route("imatinib bcr abl kinase", &hits, &thresholds()) {
            Route::Evidence(admitted) => assert_eq!(admitted.len(), 1),
            other => panic!("expected evidence route, got {:?}", other),
        }
    }
}
