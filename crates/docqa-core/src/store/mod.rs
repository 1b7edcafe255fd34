//! Index storage abstraction.
//!
//! The [`IndexStore`] trait is the single owner of chunks and their
//! embedding vectors. Implementations must guarantee:
//!
//! - chunks and vectors stay in lockstep (one vector per chunk);
//! - a reader never observes a half-applied insert or reset;
//! - a failed mutation leaves the previous contents untouched;
//! - readiness is derived from the contents, never stored separately.
//!
//! Implementations must be `Send + Sync` to be shared across request
//! handlers.

pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{QaError, Result};
use crate::models::{Chunk, Document, IndexStatus, IngestMode};

/// One document's chunks and their parallel vectors.
#[derive(Debug, Clone)]
pub struct IndexBatch {
    pub document: Document,
    pub chunks: Vec<Chunk>,
    pub vectors: Vec<Vec<f32>>,
}

impl IndexBatch {
    /// Check that the arrays are parallel and the vectors share one finite
    /// dimensionality. Returns that dimensionality, if any chunks exist.
    pub fn validate(&self) -> Result<Option<usize>> {
        if self.chunks.len() != self.vectors.len() {
            return Err(QaError::LengthMismatch {
                chunks: self.chunks.len(),
                vectors: self.vectors.len(),
            });
        }
        let Some(first) = self.vectors.first() else {
            return Ok(None);
        };
        let dims = first.len();
        if dims == 0 {
            return Err(QaError::Embedding("embedder returned empty vectors".to_string()));
        }
        for v in &self.vectors {
            if v.len() != dims {
                return Err(QaError::DimensionMismatch {
                    expected: dims,
                    actual: v.len(),
                });
            }
            if v.iter().any(|x| !x.is_finite()) {
                return Err(QaError::Embedding(
                    "embedder returned non-finite values".to_string(),
                ));
            }
        }
        Ok(Some(dims))
    }
}

/// A search hit: the chunk, its cosine similarity to the query and its
/// insertion position in the index.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
    pub position: usize,
}

/// What an insert changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsertOutcome {
    pub mode: IngestMode,
    pub inserted: usize,
    pub total_chunks: usize,
    pub generation: u64,
}

/// Immutable view of the whole index at one generation.
///
/// `chunks[i]` is embedded by `vectors[i]`; every vector is unit length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    pub documents: Vec<Document>,
    pub chunks: Vec<Chunk>,
    pub vectors: Vec<Vec<f32>>,
    pub dims: Option<usize>,
    pub generation: u64,
}

impl IndexSnapshot {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Check the lockstep invariants of a snapshot built outside the store
    /// (for example one loaded from disk).
    pub fn validate(&self) -> Result<()> {
        if self.chunks.len() != self.vectors.len() {
            return Err(QaError::LengthMismatch {
                chunks: self.chunks.len(),
                vectors: self.vectors.len(),
            });
        }
        if let Some(dims) = self.dims {
            if let Some(bad) = self.vectors.iter().find(|v| v.len() != dims) {
                return Err(QaError::DimensionMismatch {
                    expected: dims,
                    actual: bad.len(),
                });
            }
        } else if !self.vectors.is_empty() {
            return Err(QaError::Persistence(
                "snapshot has vectors but no dimensionality".to_string(),
            ));
        }
        Ok(())
    }

    pub fn status(&self) -> IndexStatus {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for c in &self.chunks {
            *counts.entry(c.document_id.as_str()).or_default() += 1;
        }
        IndexStatus {
            ready: !self.chunks.is_empty(),
            chunk_count: self.chunks.len(),
            document_count: self.documents.len(),
            dims: self.dims,
            generation: self.generation,
            documents: self
                .documents
                .iter()
                .map(|d| d.info(counts.get(d.id.as_str()).copied().unwrap_or(0)))
                .collect(),
        }
    }
}

/// Abstract vector index.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](IndexStore::insert) | Replace or extend the index with one document |
/// | [`search`](IndexStore::search) | Exact top-k by cosine similarity |
/// | [`reset`](IndexStore::reset) | Return to the empty state |
/// | [`is_ready`](IndexStore::is_ready) | True iff at least one chunk is indexed |
/// | [`status`](IndexStore::status) | Readiness plus provenance |
/// | [`snapshot`](IndexStore::snapshot) | Consistent read-only view |
/// | [`restore`](IndexStore::restore) | Swap in a previously saved snapshot |
pub trait IndexStore: Send + Sync {
    /// Insert a document's chunks and vectors.
    ///
    /// In [`IngestMode::Replace`] the previous contents are discarded in one
    /// atomic swap. In [`IngestMode::Accumulate`] the vectors must match the
    /// existing dimensionality or the call fails with
    /// [`QaError::DimensionMismatch`] and nothing changes.
    fn insert(&self, batch: IndexBatch, mode: IngestMode) -> Result<InsertOutcome>;

    /// Up to `top_k` chunks by descending cosine similarity to `query`.
    /// Ties keep insertion order. `top_k` is clamped to `[1, len]`.
    /// Fails with [`QaError::IndexNotReady`] when empty.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Discard everything. Resetting an empty index is a no-op.
    fn reset(&self);

    fn is_ready(&self) -> bool;

    fn status(&self) -> IndexStatus;

    fn snapshot(&self) -> Arc<IndexSnapshot>;

    /// Replace the contents with `snapshot` after validating it.
    fn restore(&self, snapshot: IndexSnapshot) -> Result<()>;
}
