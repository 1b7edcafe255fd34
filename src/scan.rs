//! Directory scanning for `docqa ingest --dir`.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::extract::Format;

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// Files under `root` matching `include_globs` (everything when empty)
/// with a supported extension, sorted by relative path.
pub fn scan_dir(root: &Path, include_globs: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Directory does not exist: {}", root.display());
    }

    let include_set = if include_globs.is_empty() {
        None
    } else {
        Some(build_globset(include_globs)?)
    };
    let excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    let exclude_set = build_globset(&excludes)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if let Some(set) = &include_set {
            if !set.is_match(&rel_str) {
                continue;
            }
        }
        if Format::from_path(&rel_str).is_err() {
            continue;
        }
        files.push(relative.to_path_buf());
    }

    files.sort();
    Ok(files.into_iter().map(|rel| root.join(rel)).collect())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
