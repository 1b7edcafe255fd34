//! The application engine shared by the CLI and the HTTP server.
//!
//! [`Engine`] wraps a core [`Session`] with the pieces that need I/O:
//! artifact extraction, provider construction from [`Config`], and
//! snapshot persistence. Every successful mutation of the index is written
//! to `[index].persist_dir` (when set) before the call returns; saves are
//! serialized and never write an older generation over a newer one.
//!
//! An ingest saves right after the index swap, before the summarizer runs,
//! and each save runs on its own task: a caller that gives up (a request
//! timeout) neither skips the save nor abandons it half written.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use docqa_core::{
    Answer, AnswerExtractor, FrequencySummarizer, IndexSnapshot, IndexStatus, IngestMode,
    IngestReport, IngestRequest, InMemoryIndex, LexicalExtractor, QaError, Session, Summarizer,
};
use tokio::sync::Mutex;

use crate::config::{AnswerConfig, Config, SummaryConfig};
use crate::embedding::create_embedder;
use crate::extract::{Artifact, Extractor};
use crate::persist;
use crate::remote::{RemoteExtractor, RemoteSummarizer};

/// Create the answer extractor named by `[answer].provider`.
pub fn create_answer_extractor(config: &AnswerConfig) -> Result<Arc<dyn AnswerExtractor>> {
    match config.provider.as_str() {
        "lexical" => Ok(Arc::new(LexicalExtractor::new())),
        "remote" => Ok(Arc::new(RemoteExtractor::new(config)?)),
        other => bail!("Unknown answer provider: {}", other),
    }
}

/// Create the summarizer named by `[summary].provider`. `disabled` still
/// returns the frequency summarizer for `/api/summarize`; ingest skips it.
pub fn create_summarizer(config: &SummaryConfig) -> Result<Arc<dyn Summarizer>> {
    match config.provider.as_str() {
        "frequency" | "disabled" => Ok(Arc::new(FrequencySummarizer::new(config.max_sentences))),
        "remote" => Ok(Arc::new(RemoteSummarizer::new(config)?)),
        other => bail!("Unknown summary provider: {}", other),
    }
}

struct Persistence {
    dir: PathBuf,
    model: String,
    dims: usize,
    /// Generation of the last snapshot written.
    saved: Mutex<u64>,
}

impl Persistence {
    /// Write `snapshot` unless a newer one is already on disk. An empty
    /// index removes the snapshot instead.
    async fn save(&self, snapshot: Arc<IndexSnapshot>) -> Result<(), QaError> {
        let mut saved = self.saved.lock().await;
        if snapshot.generation <= *saved {
            return Ok(());
        }

        let dir = self.dir.clone();
        let model = self.model.clone();
        let dims = self.dims;
        let generation = snapshot.generation;
        tokio::task::spawn_blocking(move || {
            if snapshot.is_empty() {
                persist::clear(&dir)
            } else {
                persist::save_snapshot(&dir, &snapshot, &model, dims)
            }
        })
        .await
        .map_err(|e| QaError::Persistence(e.to_string()))?
        .map_err(|e| QaError::Persistence(format!("{:#}", e)))?;
        *saved = generation;
        tracing::debug!(dir = %self.dir.display(), generation, "index persisted");
        Ok(())
    }
}

pub struct Engine {
    session: Session,
    extractor: Extractor,
    persistence: Option<Arc<Persistence>>,
}

impl Engine {
    /// Build the engine and restore the persisted index, if any.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_summarizer(config, create_summarizer(&config.summary)?)
    }

    /// Like [`Engine::from_config`] with `summarizer` in place of the
    /// configured one.
    pub fn with_summarizer(config: &Config, summarizer: Arc<dyn Summarizer>) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let answer = create_answer_extractor(&config.answer)?;
        let model = embedder.model_name().to_string();
        let dims = embedder.dims();

        let session = Session::new(
            Arc::new(InMemoryIndex::new()),
            embedder,
            answer,
            summarizer,
            config.session_settings(),
        );

        let persistence = match &config.index.persist_dir {
            Some(dir) => {
                let mut saved = 0;
                match persist::load_snapshot(dir, &model, dims) {
                    Ok(Some(snapshot)) => {
                        let generation = snapshot.generation;
                        let chunks = snapshot.chunks.len();
                        match session.restore(snapshot) {
                            Ok(()) => {
                                saved = generation;
                                tracing::info!(dir = %dir.display(), chunks, generation, "restored persisted index");
                            }
                            Err(e) => tracing::warn!(error = %e, "persisted index rejected, starting empty"),
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(dir = %dir.display(), error = %e, "could not load persisted index, starting empty")
                    }
                }
                Some(Arc::new(Persistence {
                    dir: dir.clone(),
                    model,
                    dims,
                    saved: Mutex::new(saved),
                }))
            }
            None => None,
        };

        Ok(Self {
            session,
            extractor: Extractor::new(&config.extract)?,
            persistence,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Extract `artifact` and ingest it.
    ///
    /// `title` overrides the extracted title when non-blank.
    pub async fn ingest_artifact(
        &self,
        artifact: Artifact,
        title: Option<String>,
        mode: IngestMode,
    ) -> Result<IngestReport, QaError> {
        let extracted = self.extractor.extract(artifact).await?;
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(extracted.title);

        tracing::info!(
            title = %title,
            source_kind = %extracted.source_kind,
            mode = %mode,
            bytes = extracted.text.len(),
            "ingesting"
        );

        let indexed = self
            .session
            .index(IngestRequest {
                title,
                text: extracted.text,
                source_kind: extracted.source_kind,
                source: extracted.source,
                pages: extracted.pages,
                mode,
            })
            .await?;

        let persisted = if indexed.report.index.is_completed() {
            self.persist().await
        } else {
            Ok(())
        };

        let mut report = self.session.summarize_indexed(indexed).await;
        if let Err(e) = persisted {
            tracing::warn!(error = %e, "failed to persist index");
            report.warnings.push(format!("index not persisted: {}", e));
        }
        Ok(report)
    }

    pub async fn ask(&self, question: &str, top_k: Option<usize>) -> Result<Answer, QaError> {
        self.session.ask(question, top_k).await
    }

    pub async fn summarize(&self, text: &str) -> Result<String, QaError> {
        self.session.summarize(text).await
    }

    pub async fn reset(&self) -> IndexStatus {
        let status = self.session.reset();
        if let Err(e) = self.persist().await {
            tracing::warn!(error = %e, "failed to clear persisted index");
        }
        status
    }

    pub fn status(&self) -> IndexStatus {
        self.session.status()
    }

    /// Persist the current snapshot on a detached task and wait for it.
    async fn persist(&self) -> Result<(), QaError> {
        let Some(p) = &self.persistence else {
            return Ok(());
        };
        let p = Arc::clone(p);
        let snapshot = self.session.snapshot();
        tokio::spawn(async move { p.save(snapshot).await })
            .await
            .map_err(|e| QaError::Persistence(e.to_string()))?
    }
}
