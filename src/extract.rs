//! Text extraction for uploaded artifacts.
//!
//! Turns pasted text, uploaded files and URLs into cleaned plain text plus
//! an optional page map. Formats are chosen by file extension (uploads) or
//! by extension and `Content-Type` (URLs):
//!
//! | Format | Extensions | Library |
//! |--------|------------|---------|
//! | plain text | `.txt`, `.text`, `.rst` | - |
//! | Markdown | `.md`, `.markdown` | `pulldown-cmark` |
//! | HTML | `.html`, `.htm` | `scrape-core` |
//! | PDF | `.pdf` | `pdf-extract`, one page at a time |
//! | Word | `.docx` | `zip` + `quick-xml` |
//!
//! GitHub repository and `blob` URLs are rewritten to their raw
//! README/file URL first; if that fetch fails the original page is fetched
//! and read as HTML.

use std::io::Read;
use std::path::Path;

use docqa_core::models::PageSpan;
use docqa_core::{QaError, SourceKind, DEFAULT_TEXT_TITLE};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use thiserror::Error;

use crate::config::ExtractConfig;
use crate::remote::http_client;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Block elements whose text becomes one paragraph.
const HTML_BLOCKS: &str = "h1, h2, h3, h4, h5, h6, p, li, pre, blockquote, td, th, dt, dd";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("{0}")]
    Parse(String),
    #[error("could not fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("{0}")]
    Invalid(String),
    #[error("upload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

impl From<ExtractError> for QaError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(ext) => QaError::UnsupportedFormat(ext),
            ExtractError::Parse(msg) => QaError::Parse(msg),
            e @ ExtractError::Fetch { .. } => QaError::Parse(e.to_string()),
            e @ (ExtractError::Invalid(_) | ExtractError::TooLarge { .. }) => {
                QaError::Validation(e.to_string())
            }
        }
    }
}

/// Something to ingest.
#[derive(Debug, Clone)]
pub enum Artifact {
    Text { text: String, title: Option<String> },
    File { name: String, bytes: Vec<u8> },
    Url(String),
}

/// Plain text ready for the ingestion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub title: String,
    pub pages: Vec<PageSpan>,
    pub source_kind: SourceKind,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Markdown,
    Html,
    Pdf,
    Docx,
}

impl Format {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" | "rst" => Some(Format::Text),
            "md" | "markdown" => Some(Format::Markdown),
            "html" | "htm" => Some(Format::Html),
            "pdf" => Some(Format::Pdf),
            "docx" => Some(Format::Docx),
            _ => None,
        }
    }

    pub fn from_path(name: &str) -> Result<Self, ExtractError> {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .ok_or_else(|| ExtractError::UnsupportedFormat(format!("'{}' has no extension", name)))?;
        Self::from_extension(&ext).ok_or(ExtractError::UnsupportedFormat(format!(".{}", ext)))
    }

    fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => Some(Format::Html),
            "text/markdown" | "text/x-markdown" => Some(Format::Markdown),
            "application/pdf" => Some(Format::Pdf),
            "text/plain" => Some(Format::Text),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Format::Docx)
            }
            _ => None,
        }
    }
}

/// Extracts text from artifacts, fetching URLs over HTTP.
pub struct Extractor {
    config: ExtractConfig,
    client: reqwest::Client,
}

impl Extractor {
    pub fn new(config: &ExtractConfig) -> anyhow::Result<Self> {
        Ok(Self {
            config: config.clone(),
            client: http_client(config.fetch_timeout_secs)?,
        })
    }

    pub async fn extract(&self, artifact: Artifact) -> Result<ExtractedText, ExtractError> {
        match artifact {
            Artifact::Text { text, title } => extract_pasted(&text, title),
            Artifact::File { name, bytes } => extract_file(&name, &bytes, &self.config),
            Artifact::Url(url) => self.extract_url(&url).await,
        }
    }

    async fn extract_url(&self, url: &str) -> Result<ExtractedText, ExtractError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ExtractError::Invalid(format!(
                "url must start with http:// or https://: '{}'",
                url
            )));
        }

        let (text, pages) = match github_raw_url(url) {
            Some(raw) => match self.fetch_and_parse(&raw, None).await {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(raw_url = %raw, error = %e, "raw fetch failed, reading page as HTML");
                    self.fetch_and_parse(url, Some(Format::Html)).await?
                }
            },
            None => self.fetch_and_parse(url, None).await?,
        };

        Ok(ExtractedText {
            text,
            title: url.to_string(),
            pages,
            source_kind: SourceKind::Url,
            source: url.to_string(),
        })
    }

    async fn fetch_and_parse(
        &self,
        url: &str,
        forced: Option<Format>,
    ) -> Result<(String, Vec<PageSpan>), ExtractError> {
        let fetch_err = |message: String| ExtractError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {}", status)));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
        check_size(bytes.len(), &self.config)?;

        let path = url.split(['?', '#']).next().unwrap_or(url);
        let format = forced
            .or_else(|| {
                Path::new(path)
                    .extension()
                    .and_then(|e| Format::from_extension(&e.to_string_lossy()))
            })
            .or_else(|| Format::from_content_type(&content_type))
            .unwrap_or(Format::Html);

        tracing::debug!(url, ?format, bytes = bytes.len(), "fetched");
        extract_bytes(format, &bytes, &self.config)
    }
}

/// Rewrite a GitHub URL to the raw file it points at.
///
/// - `raw.githubusercontent.com/...` is used as is;
/// - `github.com/<owner>/<repo>/blob/<ref>/<path>` becomes the raw file;
/// - `github.com/<owner>/<repo>` becomes its README on the default branch.
///
/// Returns `None` for anything else.
pub fn github_raw_url(url: &str) -> Option<String> {
    let rest = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');

    if rest.starts_with("raw.githubusercontent.com/") {
        return Some(format!("https://{}", rest));
    }
    let path = rest
        .strip_prefix("github.com/")
        .or_else(|| rest.strip_prefix("www.github.com/"))?;

    if let Some((owner_repo, branch_and_path)) = path.split_once("/blob/") {
        return Some(format!(
            "https://raw.githubusercontent.com/{}/{}",
            owner_repo, branch_and_path
        ));
    }
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() == 2 {
        return Some(format!(
            "https://github.com/{}/{}/raw/HEAD/README.md",
            segments[0], segments[1]
        ));
    }
    None
}

/// Blank pastes are rejected as invalid input rather than as an empty
/// document.
fn extract_pasted(text: &str, title: Option<String>) -> Result<ExtractedText, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::Invalid("text must not be empty".to_string()));
    }
    Ok(ExtractedText {
        text: text.replace("\r\n", "\n").trim().to_string(),
        title: title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TEXT_TITLE.to_string()),
        pages: Vec::new(),
        source_kind: SourceKind::Text,
        source: String::new(),
    })
}

/// Extract an uploaded file, choosing the format by extension.
pub fn extract_file(
    name: &str,
    bytes: &[u8],
    config: &ExtractConfig,
) -> Result<ExtractedText, ExtractError> {
    let format = Format::from_path(name)?;
    check_size(bytes.len(), config)?;
    let (text, pages) = extract_bytes(format, bytes, config)?;
    let title = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    Ok(ExtractedText {
        text,
        title,
        pages,
        source_kind: SourceKind::File,
        source: name.to_string(),
    })
}

fn check_size(size: usize, config: &ExtractConfig) -> Result<(), ExtractError> {
    if size > config.max_upload_bytes {
        return Err(ExtractError::TooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}

/// Extract and clean text in `format`. Only PDFs produce a page map.
pub fn extract_bytes(
    format: Format,
    bytes: &[u8],
    config: &ExtractConfig,
) -> Result<(String, Vec<PageSpan>), ExtractError> {
    let raw = match format {
        Format::Pdf => return extract_pdf(bytes, config.max_pdf_pages),
        Format::Text => utf8(bytes)?.to_string(),
        Format::Markdown => markdown_to_text(utf8(bytes)?),
        Format::Html => html_to_text(&String::from_utf8_lossy(bytes))?,
        Format::Docx => extract_docx(bytes)?,
    };
    Ok((clean_text(&raw), Vec::new()))
}

fn utf8(bytes: &[u8]) -> Result<&str, ExtractError> {
    std::str::from_utf8(bytes).map_err(|_| ExtractError::Parse("file is not valid UTF-8".to_string()))
}

/// Normalise extracted text: CRLF to LF, lines trimmed, runs of blank
/// lines collapsed to one, and lines that are only a short number (page
/// numbers) dropped.
pub fn clean_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if !line.is_empty() && line.len() <= 3 && line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if line.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Render Markdown to plain text, one blank line between blocks.
pub fn markdown_to_text(md: &str) -> String {
    let mut out = String::with_capacity(md.len());
    for event in Parser::new_ext(md, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Start(Tag::Item) => out.push_str("- "),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::TableRow,
            ) => out.push_str("\n\n"),
            Event::End(TagEnd::TableCell) => out.push(' '),
            _ => {}
        }
    }
    out
}

/// Visible text of an HTML page, one paragraph per block element.
pub fn html_to_text(html: &str) -> Result<String, ExtractError> {
    let soup = scrape_core::Soup::parse(html);
    let blocks = soup
        .find_all(HTML_BLOCKS)
        .map_err(|e| ExtractError::Parse(format!("invalid selector: {e}")))?;

    let mut paragraphs: Vec<String> = Vec::new();
    for tag in blocks {
        let text = tag.text().split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }
        // A nested block (a <p> inside an <li>) repeats its parent's text.
        if paragraphs.last().is_some_and(|prev| prev.contains(&text)) {
            continue;
        }
        paragraphs.push(text);
    }

    if paragraphs.is_empty() {
        let body = soup
            .find_all("body")
            .map_err(|e| ExtractError::Parse(format!("invalid selector: {e}")))?;
        if let Some(tag) = body.into_iter().next() {
            paragraphs.push(tag.text());
        }
    }
    Ok(paragraphs.join("\n\n"))
}

/// Per-page PDF text. `max_pages == 0` reads every page.
fn extract_pdf(bytes: &[u8], max_pages: usize) -> Result<(String, Vec<PageSpan>), ExtractError> {
    // pdf-extract panics on some malformed documents.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| ExtractError::Parse("PDF extraction failed: malformed document".to_string()))?
        .map_err(|e| ExtractError::Parse(format!("PDF extraction failed: {}", e)))?;
    let total = pages.len();
    let limit = if max_pages == 0 { total } else { max_pages.min(total) };
    if limit < total {
        tracing::info!(total, used = limit, "PDF truncated to max_pdf_pages");
    }

    let mut text = String::new();
    let mut spans = Vec::new();
    for (i, page) in pages.iter().take(limit).enumerate() {
        let cleaned = clean_text(page);
        if cleaned.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        spans.push(PageSpan {
            page: (i + 1) as u32,
            start: text.len(),
        });
        text.push_str(&cleaned);
    }
    Ok((text, spans))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let ooxml = |e: String| ExtractError::Parse(format!("DOCX extraction failed: {}", e));
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ooxml(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ooxml("word/document.xml not found".to_string()))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ooxml(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ooxml("word/document.xml exceeds size limit".to_string()));
    }
    docx_paragraphs(&doc_xml).map_err(ooxml)
}

/// Text runs (`w:t`) grouped by paragraph (`w:p`).
fn docx_paragraphs(xml: &[u8]) -> Result<String, String> {
    use quick_xml::events::Event as XmlEvent;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(XmlEvent::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(XmlEvent::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" => out.push('\n'),
                _ => {}
            },
            Ok(XmlEvent::Text(te)) if in_text => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        use std::io::Write;
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_clean_text() {
        let raw = "Intro line  \r\n\r\n\r\n  12\nBody text\n\n\n\nPage 4 of 10\n2024\n";
        assert_eq!(clean_text(raw), "Intro line\n\nBody text\n\nPage 4 of 10\n2024");
    }

    #[test]
    fn test_markdown_to_text() {
        let md = "# Setup\n\nRun `cargo build` first.\n\n- one\n- two\n\n```\nlet x = 1;\n```\n";
        let text = clean_text(&markdown_to_text(md));
        assert!(text.starts_with("Setup\n\nRun cargo build first."));
        assert!(text.contains("- one"));
        assert!(text.contains("let x = 1;"));
        assert!(!text.contains('#'));
        assert!(!text.contains('`'));
    }

    #[test]
    fn test_html_to_text_blocks() {
        let html = "<html><head><title>T</title><style>p{}</style></head><body>\
                    <h1>Guide</h1><p>First   paragraph.</p>\
                    <ul><li><p>Nested item</p></li></ul></body></html>";
        let text = html_to_text(html).unwrap();
        assert_eq!(text, "Guide\n\nFirst paragraph.\n\nNested item");
    }

    #[test]
    fn test_github_raw_url() {
        assert_eq!(
            github_raw_url("https://github.com/rust-lang/cargo/blob/master/README.md").as_deref(),
            Some("https://raw.githubusercontent.com/rust-lang/cargo/master/README.md")
        );
        assert_eq!(
            github_raw_url("https://github.com/rust-lang/cargo/").as_deref(),
            Some("https://github.com/rust-lang/cargo/raw/HEAD/README.md")
        );
        assert_eq!(
            github_raw_url("https://raw.githubusercontent.com/a/b/main/x.md").as_deref(),
            Some("https://raw.githubusercontent.com/a/b/main/x.md")
        );
        assert_eq!(github_raw_url("https://docs.rs/serde"), None);
        assert_eq!(github_raw_url("https://github.com/rust-lang/cargo/issues/1"), None);
    }

    #[test]
    fn test_extract_docx_paragraphs() {
        let bytes = docx_with_paragraphs(&["Office test phrase.", "Second para &amp; more."]);
        let out = extract_file("notes.docx", &bytes, &ExtractConfig::default()).unwrap();
        assert_eq!(out.text, "Office test phrase.\n\nSecond para & more.");
        assert_eq!(out.title, "notes.docx");
        assert_eq!(out.source_kind, SourceKind::File);
        assert!(out.pages.is_empty());
    }

    #[test]
    fn test_extract_markdown_file() {
        let out = extract_file(
            "docs/intro.MD",
            b"# Intro\n\nA variable stores a value.",
            &ExtractConfig::default(),
        )
        .unwrap();
        assert_eq!(out.text, "Intro\n\nA variable stores a value.");
        assert_eq!(out.title, "intro.MD");
    }

    #[test]
    fn test_unsupported_and_invalid_files() {
        let config = ExtractConfig::default();
        assert!(matches!(
            extract_file("image.png", b"x", &config).unwrap_err(),
            ExtractError::UnsupportedFormat(_)
        ));
        assert!(matches!(
            extract_file("Makefile", b"x", &config).unwrap_err(),
            ExtractError::UnsupportedFormat(_)
        ));
        assert!(matches!(
            extract_file("bad.pdf", b"not a pdf", &config).unwrap_err(),
            ExtractError::Parse(_)
        ));
        assert!(matches!(
            extract_file("bad.docx", b"not a zip", &config).unwrap_err(),
            ExtractError::Parse(_)
        ));
        assert!(matches!(
            extract_file("latin1.txt", &[0xff, 0xfe, 0x41], &config).unwrap_err(),
            ExtractError::Parse(_)
        ));
    }

    #[test]
    fn test_upload_size_limit() {
        let config = ExtractConfig {
            max_upload_bytes: 4,
            ..ExtractConfig::default()
        };
        let err = extract_file("a.txt", b"hello", &config).unwrap_err();
        assert!(matches!(err, ExtractError::TooLarge { size: 5, limit: 4 }));
        assert!(matches!(QaError::from(err), QaError::Validation(_)));
    }

    #[test]
    fn test_error_mapping() {
        let e: QaError = ExtractError::UnsupportedFormat(".png".into()).into();
        assert_eq!(e.code(), "unsupported_format");
        let e: QaError = ExtractError::Parse("bad".into()).into();
        assert_eq!(e.code(), "parse_error");
    }

    proptest::proptest! {
        #[test]
        fn prop_clean_text_is_idempotent(raw in "[a-z0-9 \r\n.]{0,200}") {
            let once = clean_text(&raw);
            proptest::prop_assert_eq!(clean_text(&once), once.clone());
            proptest::prop_assert!(!once.contains("\n\n\n"));
            proptest::prop_assert!(!once.contains('\r'));
        }
    }

    #[tokio::test]
    async fn test_pasted_text_default_title() {
        let extractor = Extractor::new(&ExtractConfig::default()).unwrap();
        let out = extractor
            .extract(Artifact::Text {
                text: "  Hello.\r\nWorld.  ".to_string(),
                title: Some("  ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(out.text, "Hello.\nWorld.");
        assert_eq!(out.title, DEFAULT_TEXT_TITLE);
        assert_eq!(out.source_kind, SourceKind::Text);
    }

    #[tokio::test]
    async fn test_blank_paste_is_invalid() {
        let extractor = Extractor::new(&ExtractConfig::default()).unwrap();
        let err = extractor
            .extract(Artifact::Text {
                text: " \r\n\t ".to_string(),
                title: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Invalid(_)));
        assert!(matches!(QaError::from(err), QaError::Validation(_)));
    }

    #[tokio::test]
    async fn test_url_requires_scheme() {
        let extractor = Extractor::new(&ExtractConfig::default()).unwrap();
        let err = extractor
            .extract(Artifact::Url("ftp://example.com/x".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_url_fetch_markdown_and_html() {
        use axum::{http::header, routing::get, Router};

        let app = Router::new()
            .route(
                "/guide.md",
                get(|| async { "# Guide\n\nCargo builds **packages**." }),
            )
            .route(
                "/page",
                get(|| async {
                    (
                        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                        "<html><body><p>Served as HTML.</p></body></html>",
                    )
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let extractor = Extractor::new(&ExtractConfig::default()).unwrap();
        let md = extractor
            .extract(Artifact::Url(format!("http://{}/guide.md", addr)))
            .await
            .unwrap();
        assert_eq!(md.text, "Guide\n\nCargo builds packages.");
        assert_eq!(md.source_kind, SourceKind::Url);
        assert_eq!(md.title, format!("http://{}/guide.md", addr));

        let html = extractor
            .extract(Artifact::Url(format!("http://{}/page", addr)))
            .await
            .unwrap();
        assert_eq!(html.text, "Served as HTML.");

        let missing = extractor
            .extract(Artifact::Url(format!("http://{}/missing", addr)))
            .await
            .unwrap_err();
        assert!(matches!(missing, ExtractError::Fetch { .. }));
    }
}
