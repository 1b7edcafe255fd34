//! Answer extractor capability.
//!
//! An [`AnswerExtractor`] picks a verbatim span out of one passage for one
//! question and reports how confident it is. The retrieval orchestrator
//! calls it once per candidate passage and compares the confidences.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::text::{content_terms, sentence_spans};

/// A span of the context passage. `start..end` are byte offsets into the
/// context and `text == &context[start..end]` for local extractors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Extractor confidence in `[0, 1]`.
    pub confidence: f32,
}

impl AnswerSpan {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            start: 0,
            end: 0,
            confidence: 0.0,
        }
    }
}

/// Extractive question answering over a single passage.
#[async_trait]
pub trait AnswerExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, question: &str, context: &str) -> Result<AnswerSpan>;
}

/// Sentence-level lexical extractor.
///
/// Returns the context sentence covering the largest share of the
/// question's content terms. Confidence is that share, so a passage that
/// mentions none of the question's terms scores `0.0`. Earlier sentences
/// win ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalExtractor;

impl LexicalExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn best_span(&self, question: &str, context: &str) -> AnswerSpan {
        let wanted: HashSet<String> = content_terms(question).into_iter().collect();
        if wanted.is_empty() {
            return AnswerSpan::empty();
        }

        let mut best: Option<(usize, usize, usize)> = None;
        for (start, end) in sentence_spans(context) {
            let found: HashSet<String> = content_terms(&context[start..end]).into_iter().collect();
            let covered = wanted.intersection(&found).count();
            if covered == 0 {
                continue;
            }
            if best.map_or(true, |(_, _, c)| covered > c) {
                best = Some((start, end, covered));
            }
        }

        match best {
            Some((start, end, covered)) => AnswerSpan {
                text: context[start..end].to_string(),
                start,
                end,
                confidence: covered as f32 / wanted.len() as f32,
            },
            None => AnswerSpan::empty(),
        }
    }
}

#[async_trait]
impl AnswerExtractor for LexicalExtractor {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn extract(&self, question: &str, context: &str) -> Result<AnswerSpan> {
        Ok(self.best_span(question, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: &str = "A variable stores a value. A function is reusable code.";

    #[test]
    fn test_picks_sentence_with_question_terms() {
        let span = LexicalExtractor::new().best_span("What is a variable?", CONTEXT);
        assert_eq!(span.text, "A variable stores a value.");
        assert_eq!(&CONTEXT[span.start..span.end], span.text);
        assert!((span.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_coverage_confidence() {
        let span = LexicalExtractor::new().best_span("Is a function reusable or fast?", CONTEXT);
        assert_eq!(span.text, "A function is reusable code.");
        assert!((span.confidence - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let span = LexicalExtractor::new().best_span("Who wrote Kubernetes?", CONTEXT);
        assert_eq!(span, AnswerSpan::empty());
    }

    #[test]
    fn test_stopword_only_question() {
        let span = LexicalExtractor::new().best_span("What is it?", CONTEXT);
        assert_eq!(span.confidence, 0.0);
        assert!(span.text.is_empty());
    }

    #[test]
    fn test_ties_prefer_earlier_sentence() {
        let ctx = "Caching helps. Caching also hurts.";
        let span = LexicalExtractor::new().best_span("caching", ctx);
        assert_eq!(span.text, "Caching helps.");
    }

    #[tokio::test]
    async fn test_trait_object_extract() {
        let extractor: Box<dyn AnswerExtractor> = Box::new(LexicalExtractor::new());
        let span = extractor.extract("What does a variable store?", CONTEXT).await.unwrap();
        assert!(span.text.contains("stores a value"));
        assert_eq!(extractor.name(), "lexical");
    }
}
