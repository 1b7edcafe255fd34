//! Retrieval-QA orchestrator.
//!
//! Answers a question from the current index:
//!
//! 1. Reject an empty question before touching the index.
//! 2. Fail with [`QaError::IndexNotReady`] if the index is empty. The
//!    answer extractor is never called without context.
//! 3. Embed the question once and retrieve the top-k chunks.
//! 4. Run the extractor on every retrieved chunk. A failing candidate is
//!    skipped; if all fail the call returns
//!    [`QaError::AllExtractionsFailed`].
//! 5. The candidate with the highest extractor confidence wins, ties going
//!    to the better retrieval rank. Below the confidence floor the answer
//!    is [`NO_ANSWER`], but the citations are still returned.
//!
//! Citations are always the full top-k in descending similarity.

use crate::embedding::Embedder;
use crate::error::{QaError, Result};
use crate::extractive::{AnswerExtractor, AnswerSpan};
use crate::ingest::embed_query;
use crate::models::{Answer, Citation};
use crate::store::{IndexStore, ScoredChunk};

/// Sentinel answer returned when no candidate is confident enough.
pub const NO_ANSWER: &str = "No answer found in the indexed documents.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    /// Chunks retrieved when the caller does not say.
    pub default_top_k: usize,
    /// Upper bound on caller-supplied `top_k`.
    pub max_top_k: usize,
    /// Minimum extractor confidence for an answer to count.
    pub confidence_floor: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            max_top_k: 20,
            confidence_floor: 0.1,
        }
    }
}

impl RetrievalParams {
    pub fn effective_top_k(&self, requested: Option<usize>) -> usize {
        let max = self.max_top_k.max(1);
        requested.unwrap_or(self.default_top_k).clamp(1, max)
    }
}

/// Answer `question` from `index`. See the module docs.
pub async fn ask(
    index: &dyn IndexStore,
    embedder: &dyn Embedder,
    extractor: &dyn AnswerExtractor,
    question: &str,
    top_k: Option<usize>,
    params: &RetrievalParams,
) -> Result<Answer> {
    let question = question.trim();
    if question.is_empty() {
        return Err(QaError::validation("question must not be empty"));
    }
    if !index.is_ready() {
        return Err(QaError::IndexNotReady);
    }

    let k = params.effective_top_k(top_k);
    let query = embed_query(embedder, question).await?;
    // A reset racing this request surfaces here as IndexNotReady.
    let hits = index.search(&query, k)?;
    let citations = citations(&hits);

    let mut best: Option<(usize, AnswerSpan)> = None;
    let mut failed = 0;
    for (i, hit) in hits.iter().enumerate() {
        let rank = i + 1;
        match extractor.extract(question, &hit.chunk.text).await {
            Ok(mut span) => {
                span.confidence = sanitize_confidence(&span);
                tracing::debug!(rank, confidence = span.confidence, "candidate extracted");
                if best
                    .as_ref()
                    .map_or(true, |(_, b)| span.confidence > b.confidence)
                {
                    best = Some((rank, span));
                }
            }
            Err(e) => {
                failed += 1;
                let err = QaError::Extraction(format!("{:#}", e));
                tracing::warn!(rank, chunk = %hit.chunk.id, error = %err, "skipping candidate");
            }
        }
    }

    if failed == hits.len() {
        return Err(QaError::AllExtractionsFailed { attempted: failed });
    }

    let answer = match best {
        Some((rank, span)) if span.confidence >= params.confidence_floor => Answer {
            question: question.to_string(),
            answer: span.text.trim().to_string(),
            found: true,
            confidence: span.confidence,
            source_rank: Some(rank),
            citations,
            failed_candidates: failed,
        },
        other => Answer {
            question: question.to_string(),
            answer: NO_ANSWER.to_string(),
            found: false,
            confidence: other.map(|(_, s)| s.confidence).unwrap_or(0.0),
            source_rank: None,
            citations,
            failed_candidates: failed,
        },
    };
    Ok(answer)
}

/// Empty spans carry no answer; non-finite scores count as zero.
fn sanitize_confidence(span: &AnswerSpan) -> f32 {
    if span.text.trim().is_empty() || !span.confidence.is_finite() {
        0.0
    } else {
        span.confidence.clamp(0.0, 1.0)
    }
}

fn citations(hits: &[ScoredChunk]) -> Vec<Citation> {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| Citation {
            rank: i + 1,
            chunk_id: hit.chunk.id.clone(),
            document_title: hit.chunk.document_title.clone(),
            page: hit.chunk.page,
            sequence_index: hit.chunk.sequence_index,
            text: hit.chunk.text.clone(),
            score: hit.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::embedding::HashingEmbedder;
    use crate::extractive::LexicalExtractor;
    use crate::ingest::{ingest, IngestRequest, IngestSettings};
    use crate::models::IngestMode;
    use crate::store::memory::InMemoryIndex;
    use crate::summary::FrequencySummarizer;

    /// Returns scripted results keyed by passage text.
    struct ScriptedExtractor {
        results: HashMap<String, Option<f32>>,
        calls: AtomicUsize,
    }

    impl ScriptedExtractor {
        fn new(results: &[(&str, Option<f32>)]) -> Self {
            Self {
                results: results
                    .iter()
                    .map(|(t, c)| (t.to_string(), *c))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AnswerExtractor for ScriptedExtractor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn extract(&self, _question: &str, context: &str) -> anyhow::Result<AnswerSpan> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.results.get(context).copied().flatten() {
                Some(confidence) => Ok(AnswerSpan {
                    text: context.to_string(),
                    start: 0,
                    end: context.len(),
                    confidence,
                }),
                None => anyhow::bail!("extractor crashed"),
            }
        }
    }

    /// One chunk per paragraph, accumulated into one index.
    async fn index_of(paragraphs: &[&str]) -> InMemoryIndex {
        let index = InMemoryIndex::new();
        for (i, p) in paragraphs.iter().enumerate() {
            ingest(
                &index,
                &HashingEmbedder::new(128),
                &FrequencySummarizer::default(),
                IngestRequest::text(format!("doc{}", i), *p, IngestMode::Accumulate),
                &IngestSettings {
                    summarize: false,
                    ..IngestSettings::default()
                },
            )
            .await
            .unwrap();
        }
        index
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let index = InMemoryIndex::new();
        let extractor = ScriptedExtractor::new(&[]);
        let err = ask(
            &index,
            &HashingEmbedder::new(8),
            &extractor,
            "   ",
            None,
            &RetrievalParams::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, QaError::Validation(_)));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_index_gate() {
        let index = InMemoryIndex::new();
        let extractor = ScriptedExtractor::new(&[]);
        let err = ask(
            &index,
            &HashingEmbedder::new(8),
            &extractor,
            "What is a variable?",
            Some(3),
            &RetrievalParams::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, QaError::IndexNotReady);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_highest_confidence_wins_over_similarity() {
        let a = "Rust variables are immutable by default.";
        let b = "Rust variables can be made mutable with mut.";
        let index = index_of(&[a, b]).await;
        let extractor = ScriptedExtractor::new(&[(a, Some(0.2)), (b, Some(0.9))]);

        let answer = ask(
            &index,
            &HashingEmbedder::new(128),
            &extractor,
            "Are Rust variables immutable by default?",
            Some(2),
            &RetrievalParams::default(),
        )
        .await
        .unwrap();

        assert!(answer.found);
        assert_eq!(answer.answer, b);
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].text, a);
        assert_eq!(answer.source_rank, Some(2));
        assert!(answer.citations[0].score >= answer.citations[1].score);
    }

    #[tokio::test]
    async fn test_confidence_tie_goes_to_better_rank() {
        let a = "Cargo builds Rust packages.";
        let b = "Cargo also fetches dependencies.";
        let index = index_of(&[a, b]).await;
        let extractor = ScriptedExtractor::new(&[(a, Some(0.5)), (b, Some(0.5))]);
        let answer = ask(
            &index,
            &HashingEmbedder::new(128),
            &extractor,
            "What builds Rust packages?",
            Some(2),
            &RetrievalParams::default(),
        )
        .await
        .unwrap();
        assert_eq!(answer.source_rank, Some(1));
        assert_eq!(answer.answer, answer.citations[0].text);
    }

    #[tokio::test]
    async fn test_below_floor_returns_sentinel_with_citations() {
        let a = "Tokio is an async runtime.";
        let index = index_of(&[a]).await;
        let extractor = ScriptedExtractor::new(&[(a, Some(0.05))]);
        let answer = ask(
            &index,
            &HashingEmbedder::new(128),
            &extractor,
            "What is tokio?",
            None,
            &RetrievalParams {
                confidence_floor: 0.3,
                ..RetrievalParams::default()
            },
        )
        .await
        .unwrap();
        assert!(!answer.found);
        assert_eq!(answer.answer, NO_ANSWER);
        assert_eq!(answer.source_rank, None);
        assert_eq!(answer.citations.len(), 1);
        assert!((answer.confidence - 0.05).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_failed_candidate_skipped() {
        let a = "Serde serializes Rust data structures.";
        let b = "Serde supports JSON and TOML formats.";
        let index = index_of(&[a, b]).await;
        let extractor = ScriptedExtractor::new(&[(a, None), (b, Some(0.8))]);
        let answer = ask(
            &index,
            &HashingEmbedder::new(128),
            &extractor,
            "What does serde serialize?",
            Some(2),
            &RetrievalParams::default(),
        )
        .await
        .unwrap();
        assert!(answer.found);
        assert_eq!(answer.answer, b);
        assert_eq!(answer.failed_candidates, 1);
        assert_eq!(answer.citations.len(), 2);
    }

    #[tokio::test]
    async fn test_all_candidates_failed() {
        let a = "Axum is a web framework.";
        let b = "Axum builds on tower.";
        let index = index_of(&[a, b]).await;
        let extractor = ScriptedExtractor::new(&[(a, None), (b, None)]);
        let err = ask(
            &index,
            &HashingEmbedder::new(128),
            &extractor,
            "What is axum?",
            Some(5),
            &RetrievalParams::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, QaError::AllExtractionsFailed { attempted: 2 });
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lexical_pipeline_answers_scenario() {
        let text = "A variable stores a value. A function is reusable code.";
        let index = index_of(&[text]).await;
        let answer = ask(
            &index,
            &HashingEmbedder::new(128),
            &LexicalExtractor::new(),
            "What is a variable?",
            Some(1),
            &RetrievalParams::default(),
        )
        .await
        .unwrap();
        assert!(answer.found);
        assert!(answer.answer.contains("stores a value"));
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].document_title, "doc0");
        assert_eq!(answer.citations[0].rank, 1);
    }

    #[test]
    fn test_effective_top_k() {
        let params = RetrievalParams {
            default_top_k: 4,
            max_top_k: 10,
            confidence_floor: 0.0,
        };
        assert_eq!(params.effective_top_k(None), 4);
        assert_eq!(params.effective_top_k(Some(0)), 1);
        assert_eq!(params.effective_top_k(Some(50)), 10);
    }
}
