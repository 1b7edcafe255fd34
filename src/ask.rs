//! `docqa ask` and `docqa summarize`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use docqa_core::{Answer, QaError};

use crate::config::Config;
use crate::engine::Engine;
use crate::extract::extract_file;

const SNIPPET_CHARS: usize = 160;

pub async fn run_ask(engine: &Engine, question: &str, top_k: Option<usize>) -> Result<()> {
    let answer = engine.ask(question, top_k).await?;
    print_answer(&answer);
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("Q: {}", answer.question);
    println!("A: {}", answer.answer);
    if answer.found {
        println!("  confidence: {:.3}", answer.confidence);
    }
    if answer.failed_candidates > 0 {
        println!("  failed candidates: {}", answer.failed_candidates);
    }
    println!();
    for c in &answer.citations {
        let marker = if Some(c.rank) == answer.source_rank { "*" } else { " " };
        let page = c.page.map(|p| format!(" p.{}", p)).unwrap_or_default();
        println!(
            "{}{}. [{:.3}] {}{} #{}",
            marker, c.rank, c.score, c.document_title, page, c.sequence_index
        );
        println!("    {}", snippet(&c.text));
    }
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Input for `docqa summarize`.
#[derive(Debug, Clone)]
pub enum SummarizeSource {
    Text(String),
    File(PathBuf),
}

pub async fn run_summarize(engine: &Engine, config: &Config, source: SummarizeSource) -> Result<()> {
    let text = match source {
        SummarizeSource::Text(text) => text,
        SummarizeSource::File(path) => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            extract_file(&path.to_string_lossy(), &bytes, &config.extract)
                .map_err(QaError::from)?
                .text
        }
    };
    let summary = engine.summarize(&text).await?;
    println!("{}", summary);
    Ok(())
}
