//! # docqa CLI
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa ingest --text/--file/--url/--dir` | Add a document (or a directory of them) to the index |
//! | `docqa ask "<question>"` | Answer a question from the indexed documents |
//! | `docqa summarize --text/--file` | Summarize text without indexing it |
//! | `docqa status` | Show index readiness and documents |
//! | `docqa reset` | Empty the index |
//! | `docqa serve` | Start the HTTP API server |
//!
//! CLI commands work on the index persisted under `[index].persist_dir`;
//! without it each invocation starts from an empty index.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use docqa::ask::{run_ask, run_summarize, SummarizeSource};
use docqa::config;
use docqa::engine::Engine;
use docqa::ingest::{run_ingest, IngestSource};
use docqa::status::{run_reset, run_status};
use docqa_core::IngestMode;

/// docqa: question answering over developer documentation.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa: ask questions about developer documentation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server on `[server].bind`.
    Serve,

    /// Ingest pasted text, a file, a URL or a directory.
    #[command(group(
        ArgGroup::new("source")
            .required(true)
            .args(["text", "file", "url", "dir"])
    ))]
    Ingest {
        /// Text to ingest.
        #[arg(long)]
        text: Option<String>,

        /// File to ingest (.txt, .md, .html, .pdf, .docx, ...).
        #[arg(long)]
        file: Option<PathBuf>,

        /// URL to fetch and ingest. GitHub repository URLs read the README.
        #[arg(long)]
        url: Option<String>,

        /// Directory to ingest recursively.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Include globs for `--dir` (repeatable). Defaults to every supported file.
        #[arg(long = "glob", requires = "dir")]
        globs: Vec<String>,

        /// Document title. Defaults to the filename, the URL, or "Manual Text".
        #[arg(long)]
        title: Option<String>,

        /// `replace` discards the current index; `accumulate` appends to it.
        #[arg(long, default_value = "replace")]
        mode: IngestMode,
    },

    /// Ask a question about the indexed documents.
    Ask {
        question: String,

        /// Number of passages to retrieve.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Summarize text or a file without indexing it.
    #[command(group(
        ArgGroup::new("input")
            .required(true)
            .args(["text", "file"])
    ))]
    Summarize {
        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show index readiness and the indexed documents.
    Status,

    /// Empty the index.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_or_minimal(&cli.config)?;

    let engine = || Engine::from_config(&cfg);

    match cli.command {
        Commands::Serve => docqa::server::run_server(&cfg).await?,
        Commands::Ingest {
            text,
            file,
            url,
            dir,
            globs,
            title,
            mode,
        } => {
            let source = match (text, file, url, dir) {
                (Some(text), _, _, _) => IngestSource::Text(text),
                (_, Some(path), _, _) => IngestSource::File(path),
                (_, _, Some(url), _) => IngestSource::Url(url),
                (_, _, _, Some(root)) => IngestSource::Dir { root, globs },
                _ => anyhow::bail!("one of --text, --file, --url or --dir is required"),
            };
            run_ingest(&engine()?, source, title, mode).await?;
        }
        Commands::Ask { question, top_k } => {
            run_ask(&engine()?, &question, top_k).await?;
        }
        Commands::Summarize { text, file } => {
            let source = match (text, file) {
                (Some(text), _) => SummarizeSource::Text(text),
                (_, Some(path)) => SummarizeSource::File(path),
                _ => anyhow::bail!("one of --text or --file is required"),
            };
            run_summarize(&engine()?, &cfg, source).await?;
        }
        Commands::Status => run_status(&engine()?),
        Commands::Reset => run_reset(&engine()?).await,
    }

    Ok(())
}
