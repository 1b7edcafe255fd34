//! `docqa ingest`: load text, a file, a URL or a directory into the index.
//!
//! ```text
//! ingest guide.md (replace)
//!   chunks indexed: 12
//!   total chunks: 12
//!   summary: Cargo is the Rust package manager. ...
//! ok
//! ```
//!
//! With `--dir`, the first file uses the requested mode and every later
//! file accumulates, so `--dir docs --mode replace` leaves exactly the
//! directory's documents in the index. Files that fail to extract are
//! reported and skipped.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use docqa_core::{IngestMode, IngestReport, StageOutcome};

use crate::engine::Engine;
use crate::extract::Artifact;
use crate::scan::scan_dir;

/// What `docqa ingest` reads.
#[derive(Debug, Clone)]
pub enum IngestSource {
    Text(String),
    File(PathBuf),
    Url(String),
    Dir { root: PathBuf, globs: Vec<String> },
}

pub async fn run_ingest(
    engine: &Engine,
    source: IngestSource,
    title: Option<String>,
    mode: IngestMode,
) -> Result<()> {
    match source {
        IngestSource::Text(text) => {
            let report = engine
                .ingest_artifact(Artifact::Text { text, title: None }, title, mode)
                .await?;
            print_report(&report);
            ensure_indexed(&report)?;
        }
        IngestSource::File(path) => {
            let report = engine
                .ingest_artifact(read_file(&path)?, title, mode)
                .await?;
            print_report(&report);
            ensure_indexed(&report)?;
        }
        IngestSource::Url(url) => {
            let report = engine
                .ingest_artifact(Artifact::Url(url), title, mode)
                .await?;
            print_report(&report);
            ensure_indexed(&report)?;
        }
        IngestSource::Dir { root, globs } => ingest_dir(engine, &root, &globs, mode).await?,
    }
    println!("ok");
    Ok(())
}

async fn ingest_dir(engine: &Engine, root: &Path, globs: &[String], mode: IngestMode) -> Result<()> {
    let files = scan_dir(root, globs)?;
    if files.is_empty() {
        bail!("No supported files found under {}", root.display());
    }

    let mut next_mode = mode;
    let mut ingested = 0;
    let mut skipped = 0;
    for path in &files {
        let artifact = read_file(path)?;
        match engine.ingest_artifact(artifact, None, next_mode).await {
            Ok(report) if report.index.is_completed() => {
                print_report(&report);
                ingested += 1;
                next_mode = IngestMode::Accumulate;
            }
            Ok(report) => {
                print_report(&report);
                if let Err(e) = ensure_indexed(&report) {
                    println!("skip {}: {}", path.display(), e);
                }
                skipped += 1;
            }
            Err(e) => {
                println!("skip {}: {}", path.display(), e);
                tracing::warn!(path = %path.display(), error = %e, "file skipped");
                skipped += 1;
            }
        }
    }

    println!("ingest {}", root.display());
    println!("  files ingested: {}", ingested);
    println!("  files skipped: {}", skipped);
    println!("  total chunks: {}", engine.status().chunk_count);
    if ingested == 0 {
        bail!("No files under {} could be ingested", root.display());
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Artifact> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Artifact::File {
        name: path.to_string_lossy().to_string(),
        bytes,
    })
}

fn print_report(report: &IngestReport) {
    println!("ingest {} ({})", report.document.title, report.mode);
    if let Some(pages) = report.document.page_count {
        println!("  pages: {}", pages);
    }
    println!("  chunks indexed: {}", report.chunks_indexed);
    println!("  total chunks: {}", report.total_chunks);
    if let Some(summary) = &report.summary {
        println!("  summary: {}", summary);
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
}

fn ensure_indexed(report: &IngestReport) -> Result<()> {
    if let StageOutcome::Failed { message, .. } = &report.index {
        bail!("indexing {} failed: {}", report.document.title, message);
    }
    Ok(())
}
