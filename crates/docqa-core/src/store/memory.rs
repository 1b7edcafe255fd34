//! In-memory [`IndexStore`] implementation.
//!
//! The whole index lives in one immutable [`IndexSnapshot`] behind
//! `RwLock<Arc<_>>`. Readers clone the `Arc` and release the lock before
//! scoring; writers either swap in a freshly built snapshot (replace) or
//! copy-on-write the current one (accumulate). Vector search is exact
//! brute-force cosine similarity over all stored vectors.

use std::sync::{Arc, PoisonError, RwLock};

use crate::embedding::{dot, normalize};
use crate::error::{QaError, Result};
use crate::models::{IndexStatus, IngestMode};

use super::{IndexBatch, IndexSnapshot, IndexStore, InsertOutcome, ScoredChunk};

/// Exact in-memory vector index.
pub struct InMemoryIndex {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::default())),
        }
    }

    fn load(&self) -> Arc<IndexSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn normalized(mut vectors: Vec<Vec<f32>>) -> Vec<Vec<f32>> {
    for v in vectors.iter_mut() {
        normalize(v);
    }
    vectors
}

impl IndexStore for InMemoryIndex {
    fn insert(&self, batch: IndexBatch, mode: IngestMode) -> Result<InsertOutcome> {
        let dims = batch.validate()?;
        let inserted = batch.chunks.len();
        let IndexBatch {
            document,
            chunks,
            vectors,
        } = batch;
        let vectors = normalized(vectors);

        match mode {
            IngestMode::Replace => {
                // Build the replacement before taking the write lock.
                let mut next = IndexSnapshot {
                    documents: if chunks.is_empty() {
                        Vec::new()
                    } else {
                        vec![document]
                    },
                    chunks,
                    vectors,
                    dims,
                    generation: 0,
                };
                let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
                next.generation = guard.generation + 1;
                let outcome = InsertOutcome {
                    mode,
                    inserted,
                    total_chunks: next.chunks.len(),
                    generation: next.generation,
                };
                *guard = Arc::new(next);
                tracing::debug!(
                    chunks = outcome.total_chunks,
                    generation = outcome.generation,
                    "index replaced"
                );
                Ok(outcome)
            }
            IngestMode::Accumulate => {
                let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
                let Some(dims) = dims else {
                    return Ok(InsertOutcome {
                        mode,
                        inserted: 0,
                        total_chunks: guard.chunks.len(),
                        generation: guard.generation,
                    });
                };
                if let Some(existing) = guard.dims {
                    if existing != dims {
                        return Err(QaError::DimensionMismatch {
                            expected: existing,
                            actual: dims,
                        });
                    }
                }
                let snap = Arc::make_mut(&mut guard);
                snap.documents.push(document);
                snap.chunks.extend(chunks);
                snap.vectors.extend(vectors);
                snap.dims = Some(dims);
                snap.generation += 1;
                let outcome = InsertOutcome {
                    mode,
                    inserted,
                    total_chunks: snap.chunks.len(),
                    generation: snap.generation,
                };
                tracing::debug!(
                    inserted,
                    chunks = outcome.total_chunks,
                    generation = outcome.generation,
                    "index extended"
                );
                Ok(outcome)
            }
        }
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let snap = self.load();
        if snap.is_empty() {
            return Err(QaError::IndexNotReady);
        }
        if let Some(dims) = snap.dims {
            if query.len() != dims {
                return Err(QaError::DimensionMismatch {
                    expected: dims,
                    actual: query.len(),
                });
            }
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(QaError::Embedding(
                "query embedding has non-finite values".to_string(),
            ));
        }

        let mut q = query.to_vec();
        normalize(&mut q);

        let mut scored: Vec<(usize, f32)> = snap
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(&q, v)))
            .collect();
        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let k = top_k.clamp(1, snap.len());
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(position, score)| ScoredChunk {
                chunk: snap.chunks[position].clone(),
                score,
                position,
            })
            .collect())
    }

    fn reset(&self) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if guard.is_empty() && guard.documents.is_empty() {
            return;
        }
        let generation = guard.generation + 1;
        *guard = Arc::new(IndexSnapshot {
            generation,
            ..IndexSnapshot::default()
        });
        tracing::debug!(generation, "index reset");
    }

    fn is_ready(&self) -> bool {
        !self.load().is_empty()
    }

    fn status(&self) -> IndexStatus {
        self.load().status()
    }

    fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.load()
    }

    fn restore(&self, mut snapshot: IndexSnapshot) -> Result<()> {
        snapshot.validate()?;
        snapshot.vectors = normalized(std::mem::take(&mut snapshot.vectors));
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.generation = snapshot.generation.max(guard.generation + 1);
        tracing::debug!(
            chunks = snapshot.chunks.len(),
            generation = snapshot.generation,
            "index restored"
        );
        *guard = Arc::new(snapshot);
        Ok(())
    }
}
