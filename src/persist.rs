//! On-disk index snapshots.
//!
//! A snapshot directory holds four files:
//!
//! | File | Contents |
//! |------|----------|
//! | `meta.json` | format version, embedding model and dims, generation, counts |
//! | `documents.json` | the indexed [`Document`]s, text included |
//! | `chunks.json` | every [`Chunk`], in index order |
//! | `vectors.bin` | chunk vectors as little-endian `f32`, `dims` per chunk |
//!
//! Saves are written to a sibling staging directory and swapped into
//! place with renames, so a crash never leaves a half-written snapshot
//! under the real path. A snapshot made by a different embedding model or
//! dimensionality is ignored on load.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use docqa_core::embedding::{blob_to_vec, vec_to_blob};
use docqa_core::{Chunk, Document, IndexSnapshot};
use serde::{Deserialize, Serialize};

const FORMAT_VERSION: u32 = 1;
const META_FILE: &str = "meta.json";
const DOCUMENTS_FILE: &str = "documents.json";
const CHUNKS_FILE: &str = "chunks.json";
const VECTORS_FILE: &str = "vectors.bin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub format_version: u32,
    pub model: String,
    pub dims: usize,
    pub generation: u64,
    pub saved_at: DateTime<Utc>,
    pub documents: usize,
    pub chunks: usize,
}

fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "index".to_string());
    dir.with_file_name(format!(".{}.{}", name, suffix))
}

/// Write `snapshot` to `dir`, replacing whatever is there.
pub fn save_snapshot(dir: &Path, snapshot: &IndexSnapshot, model: &str, dims: usize) -> Result<()> {
    if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let staging = sibling(dir, "staging");
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)
        .with_context(|| format!("Failed to create {}", staging.display()))?;

    let meta = SnapshotMeta {
        format_version: FORMAT_VERSION,
        model: model.to_string(),
        dims,
        generation: snapshot.generation,
        saved_at: Utc::now(),
        documents: snapshot.documents.len(),
        chunks: snapshot.chunks.len(),
    };
    fs::write(staging.join(META_FILE), serde_json::to_vec_pretty(&meta)?)?;
    fs::write(
        staging.join(DOCUMENTS_FILE),
        serde_json::to_vec(&snapshot.documents)?,
    )?;
    fs::write(staging.join(CHUNKS_FILE), serde_json::to_vec(&snapshot.chunks)?)?;

    let mut blob = Vec::with_capacity(snapshot.chunks.len() * dims * 4);
    for v in &snapshot.vectors {
        blob.extend_from_slice(&vec_to_blob(v));
    }
    fs::write(staging.join(VECTORS_FILE), blob)?;

    let previous = sibling(dir, "previous");
    if previous.exists() {
        fs::remove_dir_all(&previous)?;
    }
    if dir.exists() {
        fs::rename(dir, &previous)
            .with_context(|| format!("Failed to move aside {}", dir.display()))?;
    }
    fs::rename(&staging, dir).with_context(|| format!("Failed to write {}", dir.display()))?;
    if previous.exists() {
        fs::remove_dir_all(&previous)?;
    }

    tracing::debug!(
        dir = %dir.display(),
        generation = snapshot.generation,
        chunks = snapshot.chunks.len(),
        "snapshot saved"
    );
    Ok(())
}

/// Load the snapshot in `dir`.
///
/// Returns `Ok(None)` when there is no snapshot, or when it was built with
/// a different embedding model or dimensionality.
pub fn load_snapshot(dir: &Path, model: &str, dims: usize) -> Result<Option<IndexSnapshot>> {
    let meta_path = dir.join(META_FILE);
    if !meta_path.exists() {
        return Ok(None);
    }

    let meta: SnapshotMeta = serde_json::from_slice(&fs::read(&meta_path)?)
        .with_context(|| format!("Failed to parse {}", meta_path.display()))?;
    if meta.format_version != FORMAT_VERSION {
        bail!(
            "Unsupported snapshot format version {} in {}",
            meta.format_version,
            dir.display()
        );
    }
    if meta.model != model || meta.dims != dims {
        tracing::warn!(
            saved_model = %meta.model,
            saved_dims = meta.dims,
            model,
            dims,
            "persisted index was built with a different embedding model, starting empty"
        );
        return Ok(None);
    }

    let documents: Vec<Document> = serde_json::from_slice(&fs::read(dir.join(DOCUMENTS_FILE))?)
        .context("Failed to parse documents.json")?;
    let chunks: Vec<Chunk> = serde_json::from_slice(&fs::read(dir.join(CHUNKS_FILE))?)
        .context("Failed to parse chunks.json")?;
    let blob = fs::read(dir.join(VECTORS_FILE))?;

    let expected = chunks.len() * dims * 4;
    if blob.len() != expected {
        bail!(
            "vectors.bin is {} bytes, expected {} for {} chunks of {} dims",
            blob.len(),
            expected,
            chunks.len(),
            dims
        );
    }
    let vectors: Vec<Vec<f32>> = if dims == 0 {
        Vec::new()
    } else {
        blob.chunks_exact(dims * 4).map(blob_to_vec).collect()
    };

    Ok(Some(IndexSnapshot {
        dims: if chunks.is_empty() { None } else { Some(dims) },
        documents,
        chunks,
        vectors,
        generation: meta.generation,
    }))
}

/// Remove the snapshot in `dir`, if any.
pub fn clear(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    }
    Ok(())
}
