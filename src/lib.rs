//! # docqa
//!
//! Ask questions about developer documentation.
//!
//! docqa ingests pasted text, files (txt, Markdown, HTML, PDF, DOCX) and
//! URLs, splits them into overlapping chunks, embeds the chunks into an
//! in-memory vector index, and answers questions by extracting the best
//! span from the top retrieved passages, with citations. It runs as a CLI
//! and as a JSON HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Artifacts  │──▶│   Pipeline   │──▶│ Vector index │──▶ snapshot dir
//! │ text/file/url│   │ Chunk+Embed  │   │  (in memory) │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │ top-k
//!                      ┌──────────────────────┤
//!                      ▼                      ▼
//!                 ┌──────────┐         ┌────────────┐
//!                 │   CLI    │         │    HTTP    │
//!                 │ (docqa)  │         │   (axum)   │
//!                 └──────────┘         └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docqa ingest --file docs/guide.md      # replace the index with one file
//! docqa ingest --dir docs --mode accumulate
//! docqa ask "How do I build a package?"
//! docqa serve                            # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | Text extraction from files and URLs |
//! | [`embedding`] | Embedding provider selection |
//! | [`remote`] | Remote answer/summary models and HTTP retry |
//! | [`persist`] | On-disk index snapshots |
//! | [`engine`] | Session + extraction + persistence |
//! | [`server`] | HTTP API |
//!
//! The chunker, index, ingestion and QA orchestrators live in
//! [`docqa_core`].

pub mod ask;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod extract;
pub mod ingest;
pub mod persist;
pub mod remote;
pub mod scan;
pub mod server;
pub mod status;
