//! Ingestion orchestrator.
//!
//! Runs one document through Chunker → Embedder → Index Store and, as an
//! independent stage, through the Summarizer. The two stages report their
//! outcomes separately: a summary can be returned for a document that
//! failed to index, and a document can be indexed without a summary.
//!
//! [`ingest`] runs both stages. Callers that must act on the new index
//! before the summarizer runs (persisting it, say) call
//! [`index_document`] and [`summarize_document`] separately.
//!
//! Embedding happens before the index lock is taken. If the caller drops
//! the future mid-way (timeout, cancellation) nothing has been inserted.

use serde::Serialize;

use crate::chunk::{chunk_pages, ChunkerConfig};
use crate::embedding::Embedder;
use crate::error::{QaError, Result};
use crate::models::{Chunk, Document, DocumentInfo, IngestMode, PageSpan, SourceKind};
use crate::store::{IndexBatch, IndexStore};
use crate::summary::Summarizer;

/// Title used for pasted text when the caller supplies none.
pub const DEFAULT_TEXT_TITLE: &str = "Manual Text";

/// One document to ingest.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub title: String,
    pub text: String,
    pub source_kind: SourceKind,
    /// Filename or URL; empty for pasted text.
    pub source: String,
    pub pages: Vec<PageSpan>,
    pub mode: IngestMode,
}

impl IngestRequest {
    /// A pasted-text request with no page information.
    pub fn text(title: impl Into<String>, text: impl Into<String>, mode: IngestMode) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            source_kind: SourceKind::Text,
            source: String::new(),
            pages: Vec::new(),
            mode,
        }
    }

    fn resolved_title(&self) -> String {
        let title = self.title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
        match self.source_kind {
            SourceKind::Text => DEFAULT_TEXT_TITLE.to_string(),
            _ if !self.source.trim().is_empty() => self.source.trim().to_string(),
            _ => DEFAULT_TEXT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub chunker: ChunkerConfig,
    /// Texts per embedder call.
    pub embed_batch_size: usize,
    /// Run the summarizer after indexing.
    pub summarize: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            embed_batch_size: 64,
            summarize: true,
        }
    }
}

/// Outcome of one ingestion stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageOutcome {
    Completed,
    Skipped { reason: String },
    Failed { code: String, message: String },
}

impl StageOutcome {
    pub fn failed(err: &QaError) -> Self {
        StageOutcome::Failed {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StageOutcome::Completed)
    }
}

/// What an ingest did.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document: DocumentInfo,
    pub mode: IngestMode,
    pub chunks_indexed: usize,
    pub index: StageOutcome,
    pub summary: Option<String>,
    pub summary_outcome: StageOutcome,
    /// Index readiness observed right after the index stage.
    pub ready: bool,
    pub total_chunks: usize,
    pub generation: u64,
    pub warnings: Vec<String>,
    /// The error behind a failed index stage.
    #[serde(skip)]
    pub index_error: Option<QaError>,
}

/// A document that has been through the index stage and still awaits its
/// summary.
#[derive(Debug)]
pub struct IndexedDocument {
    pub report: IngestReport,
    text: String,
}

/// Ingest one document. See the module docs.
///
/// Returns `Err` only for input that is rejected before any stage runs
/// (currently [`QaError::EmptyDocument`]); stage failures are reported in
/// the [`IngestReport`].
pub async fn ingest(
    index: &dyn IndexStore,
    embedder: &dyn Embedder,
    summarizer: &dyn Summarizer,
    request: IngestRequest,
    settings: &IngestSettings,
) -> Result<IngestReport> {
    let indexed = index_document(index, embedder, request, settings).await?;
    Ok(summarize_document(summarizer, indexed, settings).await)
}

/// Run the chunk, embed and index stages.
///
/// The index swap is the last thing this future does, so a caller that
/// observes it return can act on the new index before summarization starts.
pub async fn index_document(
    index: &dyn IndexStore,
    embedder: &dyn Embedder,
    request: IngestRequest,
    settings: &IngestSettings,
) -> Result<IndexedDocument> {
    if request.text.trim().is_empty() {
        return Err(QaError::EmptyDocument);
    }

    let title = request.resolved_title();
    let page_count = if request.pages.is_empty() {
        None
    } else {
        Some(request.pages.len() as u32)
    };
    let mode = request.mode;
    let pages = request.pages;
    let document = Document::new(
        title,
        request.source_kind,
        request.source,
        request.text,
        page_count,
    );

    let chunks = chunk_pages(
        &document.id,
        &document.title,
        &document.raw_text,
        &pages,
        &settings.chunker,
    );

    let mut warnings = Vec::new();
    let mut index_error = None;
    let mut chunks_indexed = 0;

    let index_outcome = if chunks.is_empty() {
        let reason = format!("'{}' produced no chunks; nothing was indexed", document.title);
        tracing::warn!("{}", reason);
        warnings.push(reason.clone());
        StageOutcome::Skipped { reason }
    } else {
        let result = match embed_chunks(embedder, &chunks, settings.embed_batch_size).await {
            Ok(vectors) => index.insert(
                IndexBatch {
                    document: document.clone(),
                    chunks,
                    vectors,
                },
                mode,
            ),
            Err(e) => Err(e),
        };
        match result {
            Ok(outcome) => {
                chunks_indexed = outcome.inserted;
                tracing::info!(
                    title = %document.title,
                    chunks = outcome.inserted,
                    total = outcome.total_chunks,
                    %mode,
                    "document indexed"
                );
                StageOutcome::Completed
            }
            Err(e) => {
                tracing::error!(title = %document.title, error = %e, "indexing failed");
                let outcome = StageOutcome::failed(&e);
                index_error = Some(e);
                outcome
            }
        }
    };

    // Read back inside the same snapshot so the report matches one state.
    let snapshot = index.snapshot();

    let report = IngestReport {
        document: document.info(chunks_indexed),
        mode,
        chunks_indexed,
        index: index_outcome,
        summary: None,
        summary_outcome: StageOutcome::Skipped {
            reason: "summary not run".to_string(),
        },
        ready: !snapshot.is_empty(),
        total_chunks: snapshot.len(),
        generation: snapshot.generation,
        warnings,
        index_error,
    };
    Ok(IndexedDocument {
        report,
        text: document.raw_text,
    })
}

/// Run the summary stage for a document returned by [`index_document`].
/// Never fails: a summarizer error is recorded on the report.
pub async fn summarize_document(
    summarizer: &dyn Summarizer,
    indexed: IndexedDocument,
    settings: &IngestSettings,
) -> IngestReport {
    let IndexedDocument { mut report, text } = indexed;

    let (summary, summary_outcome) = if settings.summarize {
        match summarizer.summarize(&text).await {
            Ok(s) if !s.trim().is_empty() => (Some(s), StageOutcome::Completed),
            Ok(_) => (
                None,
                StageOutcome::Skipped {
                    reason: "summarizer returned no text".to_string(),
                },
            ),
            Err(e) => {
                let err = QaError::Summarization(format!("{:#}", e));
                tracing::warn!(title = %report.document.title, error = %err, "summary unavailable");
                report.warnings.push(format!("no summary: {}", err));
                (None, StageOutcome::failed(&err))
            }
        }
    } else {
        (
            None,
            StageOutcome::Skipped {
                reason: "summarization disabled".to_string(),
            },
        )
    };

    report.summary = summary;
    report.summary_outcome = summary_outcome;
    report
}

/// Embed chunk texts in batches, checking the embedder kept its contract.
pub async fn embed_chunks(
    embedder: &dyn Embedder,
    chunks: &[Chunk],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let out = embedder
            .embed(batch)
            .await
            .map_err(|e| QaError::Embedding(format!("{:#}", e)))?;
        if out.len() != batch.len() {
            return Err(QaError::Embedding(format!(
                "{} returned {} vectors for {} texts",
                embedder.model_name(),
                out.len(),
                batch.len()
            )));
        }
        vectors.extend(out);
    }
    Ok(vectors)
}

/// Embed a single query string.
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let mut out = embedder
        .embed(&[text.to_string()])
        .await
        .map_err(|e| QaError::Embedding(format!("{:#}", e)))?;
    match out.pop() {
        Some(v) if out.is_empty() => Ok(v),
        _ => Err(QaError::Embedding(format!(
            "{} did not return exactly one query vector",
            embedder.model_name()
        ))),
    }
}
