//! Summarizer capability.
//!
//! Summaries are produced from a document's raw text, independently of the
//! index. A summarizer failure never affects what was indexed.

use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::text::{content_terms, sentence_spans};

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Frequency-scored extractive summarizer.
///
/// Each sentence is scored by the mean corpus frequency of its content
/// terms; the best `max_sentences` are emitted in document order.
#[derive(Debug, Clone, Copy)]
pub struct FrequencySummarizer {
    pub max_sentences: usize,
}

impl FrequencySummarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }

    pub fn summarize_text(&self, text: &str) -> Option<String> {
        let spans = sentence_spans(text);
        if spans.is_empty() {
            return None;
        }
        if spans.len() <= self.max_sentences {
            return Some(join(text, &spans));
        }

        let mut freq: HashMap<String, usize> = HashMap::new();
        for term in content_terms(text) {
            *freq.entry(term).or_default() += 1;
        }

        let mut scored: Vec<(usize, f32)> = spans
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| {
                let terms = content_terms(&text[s..e]);
                let score = if terms.is_empty() {
                    0.0
                } else {
                    terms.iter().map(|t| freq.get(t).copied().unwrap_or(0)).sum::<usize>() as f32
                        / terms.len() as f32
                };
                (i, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut picked: Vec<usize> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(i, _)| i)
            .collect();
        picked.sort_unstable();

        let chosen: Vec<(usize, usize)> = picked.into_iter().map(|i| spans[i]).collect();
        Some(join(text, &chosen))
    }
}

impl Default for FrequencySummarizer {
    fn default() -> Self {
        Self::new(3)
    }
}

fn join(text: &str, spans: &[(usize, usize)]) -> String {
    spans
        .iter()
        .map(|&(s, e)| text[s..e].split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Summarizer for FrequencySummarizer {
    fn name(&self) -> &str {
        "frequency"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        match self.summarize_text(text) {
            Some(summary) => Ok(summary),
            None => bail!("text has no sentences to summarize"),
        }
    }
}
