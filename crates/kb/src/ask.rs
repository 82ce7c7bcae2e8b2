//! Knowledge-base answering orchestration.
//!
//! One question flows through: small-talk check, query embedding, kNN
//! retrieval, hit admission, evidence packaging, managed generation, and
//! the citation gate. All external collaborators come in through the
//! context object so tests can substitute them.

use crate::gate;
use crate::generate::{AnswerGenerator, GenerateRequest};
use crate::router;
use crate::search::VectorSearch;
use crate::sources;
use crate::types::{CandidateHit, KbAnswer, Route};
use labchat_core::{AppConfig, AppResult};
use labchat_llm::{ConverseRequest, ModelClient};
use labchat_prompt::{CHITCHAT_SYSTEM, KB_ANSWER_TEMPLATE};
use std::sync::Arc;

/// Dependencies for the knowledge-base pipeline.
///
/// Constructed explicitly (no process-global clients) so the embedding,
/// search, and generation collaborators can be swapped out in tests.
pub struct KbContext {
    pub model: Arc<dyn ModelClient>,
    pub search: Arc<dyn VectorSearch>,
    pub generator: Arc<dyn AnswerGenerator>,
    pub config: AppConfig,
}

impl KbContext {
    pub fn new(
        model: Arc<dyn ModelClient>,
        search: Arc<dyn VectorSearch>,
        generator: Arc<dyn AnswerGenerator>,
        config: AppConfig,
    ) -> Self {
        Self {
            model,
            search,
            generator,
            config,
        }
    }
}

/// Answer a question against the knowledge base.
///
/// Greetings bypass retrieval entirely. Otherwise the question is
/// embedded, the index queried, and the hit filter decides between the
/// evidence path and the no-citation fallback.
pub async fn ask(ctx: &KbContext, question: &str) -> AppResult<KbAnswer> {
    tracing::info!("KB query: {}", question);

    // The small-talk check runs before retrieval so greetings never
    // reach the search client
    let route = if router::is_smalltalk(question) {
        tracing::info!("Small talk detected, skipping retrieval");
        Route::ChitChat
    } else {
        let vector = ctx
            .model
            .embed(&ctx.config.embedding_model, question)
            .await?;

        let hits = ctx.search.knn(&vector, ctx.config.thresholds.top_k).await?;
        router::route(question, &hits, &ctx.config.thresholds)
    };

    match route {
        Route::ChitChat | Route::Fallback => converse_unsourced(ctx, question).await,
        Route::Evidence(admitted) => answer_from_evidence(ctx, question, &admitted).await,
    }
}

/// Answer conversationally, without evidence or citations.
async fn converse_unsourced(ctx: &KbContext, question: &str) -> AppResult<KbAnswer> {
    let request = ConverseRequest::new(&ctx.config.model, question)
        .with_system(CHITCHAT_SYSTEM)
        .with_params(ctx.config.kb_generation);

    let response = ctx.model.converse(&request).await?;
    Ok(KbAnswer::unsourced(response.text))
}

/// Generate an answer grounded in the admitted evidence.
async fn answer_from_evidence(
    ctx: &KbContext,
    question: &str,
    admitted: &[CandidateHit],
) -> AppResult<KbAnswer> {
    let evidence = build_evidence_blob(admitted);

    let request = GenerateRequest {
        question: question.to_string(),
        evidence,
        identifier: format!("knn-top{}", admitted.len()),
        template: KB_ANSWER_TEMPLATE.to_string(),
        params: ctx.config.kb_generation,
        model: ctx.config.model.clone(),
    };

    let answer = ctx.generator.generate(&request).await?;

    // The generated text itself decides citation visibility: the pinned
    // refusal sentence means the evidence did not answer the question.
    if gate::suppress_citations(&answer) {
        tracing::info!("Difficulty marker present, suppressing citations");
        return Ok(KbAnswer {
            answer,
            sources: Vec::new(),
            from_evidence: true,
        });
    }

    let urls = sources::collect_source_urls(admitted, &ctx.config.region);
    Ok(KbAnswer::cited(answer, urls))
}

/// Concatenate admitted passages into one tagged evidence blob.
fn build_evidence_blob(admitted: &[CandidateHit]) -> String {
    let chunks: Vec<String> = admitted
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[Source {}] {}\n{}", i + 1, hit.source, hit.text))
        .collect();

    chunks.join("\n\n----\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use labchat_core::AppError;
    use labchat_llm::MockClient;
    use std::sync::Mutex;

    /// Scripted vector index that records whether it was queried.
    struct MockSearch {
        hits: Vec<CandidateHit>,
        calls: Mutex<usize>,
    }

    impl MockSearch {
        fn returning(hits: Vec<CandidateHit>) -> Self {
            Self {
                hits,
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl VectorSearch for MockSearch {
        async fn knn(&self, _vector: &[f32], _k: usize) -> AppResult<Vec<CandidateHit>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.hits.clone())
        }
    }

    /// Scripted generator that records the requests it saw.
    struct MockGenerator {
        answer: String,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl MockGenerator {
        fn answering(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> Option<GenerateRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait::async_trait]
    impl AnswerGenerator for MockGenerator {
        async fn generate(&self, request: &GenerateRequest) -> AppResult<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.answer.clone())
        }
    }

    fn strong_hit(source: &str) -> CandidateHit {
        CandidateHit::new(
            0.9,
            format!(
                "Imatinib inhibits the BCR-ABL fusion kinase. {}",
                "x".repeat(200)
            ),
            source,
        )
    }

    fn context(
        search: Arc<MockSearch>,
        generator: Arc<MockGenerator>,
    ) -> (KbContext, Arc<MockClient>) {
        let model = Arc::new(MockClient::new(64));
        let mut config = AppConfig::default();
        config.provider = "mock".to_string();

        let ctx = KbContext::new(model.clone(), search, generator, config);
        (ctx, model)
    }

    #[tokio::test]
    async fn test_greeting_bypasses_retrieval() {
        let search = Arc::new(MockSearch::returning(vec![strong_hit("s3://p/a.pdf")]));
        let generator = Arc::new(MockGenerator::answering("unused"));
        let (ctx, model) = context(search.clone(), generator.clone());

        model.push_text_reply("Hello! What would you like to know?");

        let answer = ask(&ctx, "Hello there").await.unwrap();

        assert_eq!(search.call_count(), 0);
        assert!(generator.last_request().is_none());
        assert!(!answer.from_evidence);
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn test_no_admissible_hits_falls_back_without_citations() {
        // Low scores, short texts, no overlap, flat margin: nothing admitted
        let search = Arc::new(MockSearch::returning(vec![
            CandidateHit::new(0.05, "short a", "s3://p/a.pdf"),
            CandidateHit::new(0.05, "short b", "s3://p/b.pdf"),
        ]));
        let generator = Arc::new(MockGenerator::answering("unused"));
        let (ctx, model) = context(search.clone(), generator.clone());

        model.push_text_reply("From general knowledge: ...");

        let answer = ask(&ctx, "imatinib resistance mutations").await.unwrap();

        assert_eq!(search.call_count(), 1);
        assert!(generator.last_request().is_none());
        assert!(answer.sources.is_empty());
        assert!(!answer.from_evidence);
    }

    #[tokio::test]
    async fn test_evidence_path_cites_deduplicated_https_sources() {
        let search = Arc::new(MockSearch::returning(vec![
            strong_hit("s3://papers/imatinib.pdf"),
            strong_hit("s3://papers/imatinib.pdf"),
        ]));
        let generator = Arc::new(MockGenerator::answering(
            "Imatinib selectively inhibits BCR-ABL.",
        ));
        let (ctx, _model) = context(search.clone(), generator.clone());

        let answer = ask(&ctx, "imatinib kinase inhibition mechanism").await.unwrap();

        assert!(answer.from_evidence);
        assert_eq!(
            answer.sources,
            vec!["https://papers.s3.us-west-2.amazonaws.com/imatinib.pdf".to_string()]
        );

        let request = generator.last_request().unwrap();
        assert!(request.evidence.contains("[Source 1] s3://papers/imatinib.pdf"));
        assert!(request.template.contains("$search_results$"));
        assert_eq!(request.identifier, "knn-top2");
    }

    #[tokio::test]
    async fn test_difficulty_marker_suppresses_citations() {
        let search = Arc::new(MockSearch::returning(vec![strong_hit("s3://p/a.pdf")]));
        let generator = Arc::new(MockGenerator::answering(
            "I could not find this in the provided documents.",
        ));
        let (ctx, _model) = context(search, generator);

        let answer = ask(&ctx, "imatinib kinase inhibition mechanism").await.unwrap();

        assert!(answer.sources.is_empty());
        assert!(answer.from_evidence);
    }

    #[tokio::test]
    async fn test_search_error_propagates() {
        struct FailingSearch;

        #[async_trait::async_trait]
        impl VectorSearch for FailingSearch {
            async fn knn(&self, _vector: &[f32], _k: usize) -> AppResult<Vec<CandidateHit>> {
                Err(AppError::Search("index unavailable".to_string()))
            }
        }

        let generator = Arc::new(MockGenerator::answering("unused"));
        let model = Arc::new(MockClient::new(64));
        let mut config = AppConfig::default();
        config.provider = "mock".to_string();
        let ctx = KbContext::new(model, Arc::new(FailingSearch), generator, config);

        let result = ask(&ctx, "imatinib mechanism").await;
        assert!(matches!(result, Err(AppError::Search(_))));
    }

    #[test]
    fn test_evidence_blob_format() {
        let admitted = vec![
            CandidateHit::new(0.9, "First passage.", "s3://p/a.pdf"),
            CandidateHit::new(0.8, "Second passage.", "s3://p/b.pdf"),
        ];

        let blob = build_evidence_blob(&admitted);
        assert!(blob.starts_with("[Source 1] s3://p/a.pdf\nFirst passage."));
        assert!(blob.contains("\n\n----\n\n"));
        assert!(blob.contains("[Source 2] s3://p/b.pdf\nSecond passage."));
    }
}
