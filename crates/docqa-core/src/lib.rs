//! # docqa core
//!
//! Runtime-agnostic core of the document QA service: data models, the
//! chunker, the vector index, and the ingestion and retrieval-QA
//! orchestrators.
//!
//! Model calls sit behind three capability traits so local, remote and
//! mock implementations can be swapped without touching the pipeline:
//!
//! | Trait | Local implementation |
//! |-------|----------------------|
//! | [`Embedder`] | [`HashingEmbedder`] |
//! | [`AnswerExtractor`] | [`LexicalExtractor`] |
//! | [`Summarizer`] | [`FrequencySummarizer`] |
//!
//! This crate contains no tokio runtime, HTTP or filesystem I/O.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod extractive;
pub mod ingest;
pub mod models;
pub mod qa;
pub mod session;
pub mod store;
pub mod summary;
mod text;

pub use chunk::ChunkerConfig;
pub use embedding::{Embedder, HashingEmbedder};
pub use error::{QaError, Result};
pub use extractive::{AnswerExtractor, AnswerSpan, LexicalExtractor};
pub use ingest::{
    IndexedDocument, IngestReport, IngestRequest, IngestSettings, StageOutcome, DEFAULT_TEXT_TITLE,
};
pub use models::{Answer, Chunk, Citation, Document, IndexStatus, IngestMode, SourceKind};
pub use qa::{RetrievalParams, NO_ANSWER};
pub use session::{Session, SessionSettings};
pub use store::memory::InMemoryIndex;
pub use store::{IndexBatch, IndexSnapshot, IndexStore};
pub use summary::{FrequencySummarizer, Summarizer};
pub use text::{content_terms, sentence_spans};
