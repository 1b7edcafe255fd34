//! The process-wide context object.
//!
//! A [`Session`] owns the index handle and the three model capabilities.
//! It is built once at startup and shared (behind an `Arc`) by every
//! request handler; there is no ambient global state. Readiness is never
//! stored on the session: every query reads it from the index snapshot.

use std::sync::Arc;

use crate::embedding::{Embedder, HashingEmbedder};
use crate::error::{QaError, Result};
use crate::extractive::{AnswerExtractor, LexicalExtractor};
use crate::ingest::{self, IndexedDocument, IngestReport, IngestRequest, IngestSettings};
use crate::models::{Answer, IndexStatus};
use crate::qa::{self, RetrievalParams};
use crate::store::memory::InMemoryIndex;
use crate::store::{IndexSnapshot, IndexStore};
use crate::summary::{FrequencySummarizer, Summarizer};

#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub ingest: IngestSettings,
    pub retrieval: RetrievalParams,
}

pub struct Session {
    index: Arc<dyn IndexStore>,
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn AnswerExtractor>,
    summarizer: Arc<dyn Summarizer>,
    settings: SessionSettings,
}

impl Session {
    pub fn new(
        index: Arc<dyn IndexStore>,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn AnswerExtractor>,
        summarizer: Arc<dyn Summarizer>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            index,
            embedder,
            extractor,
            summarizer,
            settings,
        }
    }

    /// A fully offline session: in-memory index, hashing embedder, lexical
    /// extractor and frequency summarizer.
    pub fn local(settings: SessionSettings) -> Self {
        Self::new(
            Arc::new(InMemoryIndex::new()),
            Arc::new(HashingEmbedder::default()),
            Arc::new(LexicalExtractor::new()),
            Arc::new(FrequencySummarizer::default()),
            settings,
        )
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReport> {
        ingest::ingest(
            self.index.as_ref(),
            self.embedder.as_ref(),
            self.summarizer.as_ref(),
            request,
            &self.settings.ingest,
        )
        .await
    }

    /// The index stage of [`Session::ingest`]; finish with
    /// [`Session::summarize_indexed`].
    pub async fn index(&self, request: IngestRequest) -> Result<IndexedDocument> {
        ingest::index_document(
            self.index.as_ref(),
            self.embedder.as_ref(),
            request,
            &self.settings.ingest,
        )
        .await
    }

    pub async fn summarize_indexed(&self, indexed: IndexedDocument) -> IngestReport {
        ingest::summarize_document(self.summarizer.as_ref(), indexed, &self.settings.ingest).await
    }

    pub async fn ask(&self, question: &str, top_k: Option<usize>) -> Result<Answer> {
        qa::ask(
            self.index.as_ref(),
            self.embedder.as_ref(),
            self.extractor.as_ref(),
            question,
            top_k,
            &self.settings.retrieval,
        )
        .await
    }

    /// Summarize arbitrary text without touching the index.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(QaError::validation("text must not be empty"));
        }
        self.summarizer
            .summarize(text)
            .await
            .map_err(|e| QaError::Summarization(format!("{:#}", e)))
    }

    pub fn reset(&self) -> IndexStatus {
        self.index.reset();
        tracing::info!("index reset");
        self.index.status()
    }

    pub fn status(&self) -> IndexStatus {
        self.index.status()
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.snapshot()
    }

    pub fn restore(&self, snapshot: IndexSnapshot) -> Result<()> {
        self.index.restore(snapshot)
    }
}
