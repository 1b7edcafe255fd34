//! Integration tests for multi-format file ingest: PDF, DOCX, HTML and
//! Markdown through the CLI, plus the upload size limit.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docqa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("docqa");
    path
}

/// Minimal valid PDF containing the text "pdfs test phrase".
/// Builds body then xref with correct byte offsets so pdf-extract can parse it.
fn minimal_pdf_with_phrase() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(b"4 0 obj << /Length 44 >> stream\nBT /F1 12 Tf 100 700 Td (pdfs test phrase) Tj ET\nendstream endobj\n");
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o1).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o2).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o3).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o4).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o5).as_bytes());
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn minimal_docx_with_text(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
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

fn setup_file_support_env(max_upload_bytes: Option<usize>) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::create_dir_all(root.join("files")).unwrap();

    let mut config_content = format!(
        r#"[index]
persist_dir = "{}/data/index"

[extract]
max_pdf_pages = 50
"#,
        root.display()
    );
    if let Some(limit) = max_upload_bytes {
        config_content.push_str(&format!("max_upload_bytes = {}\n", limit));
    }

    let config_path = root.join("config").join("docqa.toml");
    fs::write(&config_path, config_content).unwrap();
    (tmp, config_path)
}

fn write_file(config_path: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("files")
        .join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn run_docqa(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(docqa_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run docqa");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn test_pdf_ingest_and_ask() {
    let (_tmp, config_path) = setup_file_support_env(None);
    let pdf = write_file(&config_path, "manual.pdf", &minimal_pdf_with_phrase());

    let (stdout, stderr, success) =
        run_docqa(&config_path, &["ingest", "--file", pdf.to_str().unwrap()]);
    assert!(success, "pdf ingest failed: {}", stderr);
    assert!(stdout.contains("ingest manual.pdf"));
    assert!(stdout.contains("pages: 1"), "stdout: {}", stdout);

    let (stdout, _, success) = run_docqa(&config_path, &["ask", "Which test phrase?"]);
    assert!(success);
    assert!(stdout.contains("pdfs test phrase"), "stdout: {}", stdout);
    assert!(stdout.contains("manual.pdf p.1"), "stdout: {}", stdout);
}

#[test]
fn test_docx_ingest_and_ask() {
    let (_tmp, config_path) = setup_file_support_env(None);
    let docx = write_file(
        &config_path,
        "notes.docx",
        &minimal_docx_with_text(&["Office test phrase.", "Deployment uses Kubernetes."]),
    );

    let (stdout, stderr, success) =
        run_docqa(&config_path, &["ingest", "--file", docx.to_str().unwrap()]);
    assert!(success, "docx ingest failed: {}", stderr);
    assert!(stdout.contains("ingest notes.docx"));

    let (stdout, _, success) = run_docqa(&config_path, &["ask", "What does deployment use?"]);
    assert!(success);
    assert!(stdout.contains("A: Deployment uses Kubernetes."), "stdout: {}", stdout);
}

#[test]
fn test_html_and_markdown_accumulate() {
    let (_tmp, config_path) = setup_file_support_env(None);
    let html = write_file(
        &config_path,
        "page.html",
        b"<html><head><script>var ignored = 1;</script></head><body><h1>Install</h1><p>Run rustup to install the toolchain.</p></body></html>",
    );
    let md = write_file(
        &config_path,
        "guide.md",
        b"# Guide\n\nClippy lints **common mistakes**.",
    );

    let (_, stderr, success) =
        run_docqa(&config_path, &["ingest", "--file", html.to_str().unwrap()]);
    assert!(success, "{}", stderr);
    let (_, stderr, success) = run_docqa(
        &config_path,
        &["ingest", "--file", md.to_str().unwrap(), "--mode", "accumulate"],
    );
    assert!(success, "{}", stderr);

    let (stdout, _, _) = run_docqa(&config_path, &["status"]);
    assert!(stdout.contains("documents:  2"));

    let (stdout, _, _) = run_docqa(&config_path, &["ask", "How do I install the toolchain?"]);
    assert!(stdout.contains("A: Run rustup to install the toolchain."), "stdout: {}", stdout);
    assert!(!stdout.contains("ignored"));

    let (stdout, _, _) = run_docqa(&config_path, &["ask", "What does Clippy lint?"]);
    assert!(stdout.contains("A: Clippy lints common mistakes."), "stdout: {}", stdout);
}

#[test]
fn test_corrupt_pdf_fails_without_touching_index() {
    let (_tmp, config_path) = setup_file_support_env(None);
    let (_, _, success) = run_docqa(
        &config_path,
        &["ingest", "--text", "Existing document text."],
    );
    assert!(success);

    let bad = write_file(&config_path, "broken.pdf", b"%PDF-1.4 not really");
    let (_, stderr, success) =
        run_docqa(&config_path, &["ingest", "--file", bad.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("PDF"), "stderr: {}", stderr);

    let (stdout, _, _) = run_docqa(&config_path, &["status"]);
    assert!(stdout.contains("documents:  1"));
    assert!(stdout.contains("Manual Text"));
}

#[test]
fn test_upload_limit() {
    let (_tmp, config_path) = setup_file_support_env(Some(16));
    let big = write_file(&config_path, "big.txt", "word ".repeat(100).as_bytes());

    let (_, stderr, success) =
        run_docqa(&config_path, &["ingest", "--file", big.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("limit is 16"), "stderr: {}", stderr);
}
