//! Core data models for the ingestion and retrieval pipeline.
//!
//! Documents are immutable once created; chunks are slices of a document's
//! text; citations and answers are derived, never stored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QaError;

/// Where a document's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    File,
    Url,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Text => "text",
            SourceKind::File => "file",
            SourceKind::Url => "url",
        };
        f.write_str(s)
    }
}

/// How an ingest interacts with the existing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Discard the current index and replace it with the new document.
    #[default]
    Replace,
    /// Append the new document to the current index.
    Accumulate,
}

impl FromStr for IngestMode {
    type Err = QaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(IngestMode::Replace),
            "accumulate" => Ok(IngestMode::Accumulate),
            other => Err(QaError::validation(format!(
                "unknown ingest mode '{}': use replace or accumulate",
                other
            ))),
        }
    }
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestMode::Replace => f.write_str("replace"),
            IngestMode::Accumulate => f.write_str("accumulate"),
        }
    }
}

/// A page boundary inside extracted text: `page` begins at byte `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpan {
    pub page: u32,
    pub start: usize,
}

/// A logical ingested unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub source_kind: SourceKind,
    /// Filename or URL; empty for pasted text.
    pub source: String,
    pub raw_text: String,
    pub ingested_at: DateTime<Utc>,
    pub page_count: Option<u32>,
}

impl Document {
    pub fn new(
        title: impl Into<String>,
        source_kind: SourceKind,
        source: impl Into<String>,
        raw_text: impl Into<String>,
        page_count: Option<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            source_kind,
            source: source.into(),
            raw_text: raw_text.into(),
            ingested_at: Utc::now(),
            page_count,
        }
    }

    pub fn info(&self, chunk_count: usize) -> DocumentInfo {
        DocumentInfo {
            id: self.id.clone(),
            title: self.title.clone(),
            source_kind: self.source_kind,
            source: self.source.clone(),
            ingested_at: self.ingested_at,
            page_count: self.page_count,
            chunk_count,
        }
    }
}

/// Provenance of an indexed document, without its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub title: String,
    pub source_kind: SourceKind,
    pub source: String,
    pub ingested_at: DateTime<Utc>,
    pub page_count: Option<u32>,
    pub chunk_count: usize,
}

/// A contiguous slice of a document's text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub document_title: String,
    /// Position within the owning document, starting at 0.
    pub sequence_index: usize,
    pub page: Option<u32>,
    pub text: String,
    /// SHA-256 of `text`.
    pub hash: String,
}

/// A retrieved chunk shown as evidence for an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    /// 1-based position in the retrieval ranking.
    pub rank: usize,
    pub chunk_id: String,
    pub document_title: String,
    pub page: Option<u32>,
    pub sequence_index: usize,
    pub text: String,
    /// Cosine similarity between the question and this chunk.
    pub score: f32,
}

/// Result of a retrieval-QA request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    /// False when no candidate cleared the confidence floor.
    pub found: bool,
    pub confidence: f32,
    /// Rank of the citation the answer was extracted from.
    pub source_rank: Option<usize>,
    pub citations: Vec<Citation>,
    /// Candidates whose extraction call failed and were skipped.
    pub failed_candidates: usize,
}

/// Observable state of the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStatus {
    pub ready: bool,
    pub chunk_count: usize,
    pub document_count: usize,
    pub dims: Option<usize>,
    /// Incremented on every mutation.
    pub generation: u64,
    pub documents: Vec<DocumentInfo>,
}
