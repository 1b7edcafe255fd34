//! Configuration loading and validation.
//!
//! docqa reads a single TOML file. Every section is optional; missing keys
//! fall back to the defaults below, and [`Config::minimal`] is what an empty
//! file produces.
//!
//! ```toml
//! [index]
//! persist_dir = "./data/index"
//!
//! [chunking]
//! max_tokens = 250
//! min_tokens = 25
//! overlap_tokens = 40
//!
//! [retrieval]
//! top_k = 3
//! max_top_k = 20
//! confidence_floor = 0.1
//!
//! [embedding]
//! provider = "hash"        # hash | openai | ollama | local
//! dims = 384
//!
//! [answer]
//! provider = "lexical"     # lexical | remote
//!
//! [summary]
//! provider = "frequency"   # frequency | remote | disabled
//! max_sentences = 3
//!
//! [extract]
//! max_pdf_pages = 200
//! max_upload_bytes = 20971520
//! fetch_timeout_secs = 15
//!
//! [server]
//! bind = "127.0.0.1:8000"
//! request_timeout_secs = 120
//! ```

use anyhow::{Context, Result};
use docqa_core::{ChunkerConfig, IngestSettings, RetrievalParams, SessionSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IndexConfig {
    /// Directory holding the persisted index. `None` keeps the index in
    /// memory only.
    #[serde(default)]
    pub persist_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
    #[serde(default = "default_overlap")]
    pub overlap_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            min_tokens: default_min_tokens(),
            overlap_tokens: default_overlap(),
        }
    }
}

fn default_max_tokens() -> usize {
    250
}
fn default_min_tokens() -> usize {
    25
}
fn default_overlap() -> usize {
    40
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            confidence_floor: default_confidence_floor(),
        }
    }
}

fn default_top_k() -> usize {
    3
}
fn default_max_top_k() -> usize {
    20
}
fn default_confidence_floor() -> f32 {
    0.1
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// Answer extraction provider.
#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    #[serde(default = "default_answer_provider")]
    pub provider: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_remote_retries")]
    pub max_retries: u32,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            provider: default_answer_provider(),
            url: None,
            model: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_remote_retries(),
        }
    }
}

fn default_answer_provider() -> String {
    "lexical".to_string()
}
fn default_remote_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    #[serde(default = "default_summary_provider")]
    pub provider: String,
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_remote_retries")]
    pub max_retries: u32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            provider: default_summary_provider(),
            max_sentences: default_max_sentences(),
            url: None,
            model: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_remote_retries(),
        }
    }
}

impl SummaryConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_summary_provider() -> String {
    "frequency".to_string()
}
fn default_max_sentences() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    /// Pages read from a PDF; `0` reads all of them.
    #[serde(default = "default_max_pdf_pages")]
    pub max_pdf_pages: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_pdf_pages: default_max_pdf_pages(),
            max_upload_bytes: default_max_upload_bytes(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_max_pdf_pages() -> usize {
    200
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}
fn default_fetch_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Config {
    /// All defaults, in-memory index.
    pub fn minimal() -> Self {
        Self::default()
    }

    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            max_tokens: self.chunking.max_tokens,
            min_tokens: self.chunking.min_tokens,
            overlap_tokens: self.chunking.overlap_tokens,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            ingest: IngestSettings {
                chunker: self.chunker(),
                embed_batch_size: self.embedding.batch_size,
                summarize: self.summary.is_enabled(),
            },
            retrieval: RetrievalParams {
                default_top_k: self.retrieval.top_k,
                max_top_k: self.retrieval.max_top_k,
                confidence_floor: self.retrieval.confidence_floor,
            },
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    let c = &config.chunking;
    if c.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }
    if c.min_tokens > c.max_tokens {
        anyhow::bail!("chunking.min_tokens must be <= chunking.max_tokens");
    }
    if c.overlap_tokens >= c.max_tokens {
        anyhow::bail!("chunking.overlap_tokens must be < chunking.max_tokens");
    }

    // Validate retrieval
    let r = &config.retrieval;
    if r.top_k < 1 || r.max_top_k < 1 {
        anyhow::bail!("retrieval.top_k and retrieval.max_top_k must be >= 1");
    }
    if r.top_k > r.max_top_k {
        anyhow::bail!("retrieval.top_k must be <= retrieval.max_top_k");
    }
    if !(0.0..=1.0).contains(&r.confidence_floor) {
        anyhow::bail!("retrieval.confidence_floor must be in [0.0, 1.0]");
    }

    // Validate embedding
    let e = &config.embedding;
    if e.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    if e.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0");
    }
    match e.provider.as_str() {
        "hash" | "local" => {}
        "openai" | "ollama" => {
            if e.dims.is_none() {
                anyhow::bail!("embedding.dims must be set when provider is '{}'", e.provider);
            }
            if e.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    e.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be hash, openai, ollama, or local.",
            other
        ),
    }

    match config.answer.provider.as_str() {
        "lexical" => {}
        "remote" => {
            if config.answer.url.is_none() {
                anyhow::bail!("answer.url must be set when provider is 'remote'");
            }
        }
        other => anyhow::bail!(
            "Unknown answer provider: '{}'. Must be lexical or remote.",
            other
        ),
    }

    match config.summary.provider.as_str() {
        "frequency" | "disabled" => {}
        "remote" => {
            if config.summary.url.is_none() {
                anyhow::bail!("summary.url must be set when provider is 'remote'");
            }
        }
        other => anyhow::bail!(
            "Unknown summary provider: '{}'. Must be frequency, remote, or disabled.",
            other
        ),
    }
    if config.summary.max_sentences == 0 {
        anyhow::bail!("summary.max_sentences must be > 0");
    }

    if config.extract.max_upload_bytes == 0 {
        anyhow::bail!("extract.max_upload_bytes must be > 0");
    }
    if config.server.request_timeout_secs == 0 {
        anyhow::bail!("server.request_timeout_secs must be > 0");
    }

    Ok(())
}
