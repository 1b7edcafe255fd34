//! Remote model providers and the HTTP retry policy they share.
//!
//! [`RemoteExtractor`] and [`RemoteSummarizer`] call Hugging Face
//! inference-compatible endpoints:
//!
//! | Capability | Request | Response |
//! |------------|---------|----------|
//! | answer extraction | `{"inputs": {"question": q, "context": c}}` | `{"answer", "score", "start", "end"}` |
//! | summarization | `{"inputs": text}` | `[{"summary_text": s}]` |
//!
//! A bearer token is sent when `HF_API_TOKEN` is set.
//!
//! # Retry Strategy
//!
//! [`post_json_with_retry`] uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use docqa_core::{AnswerExtractor, AnswerSpan, Summarizer};
use serde_json::{json, Value};

use crate::config::{AnswerConfig, SummaryConfig};

/// Environment variable holding the inference API token.
pub const TOKEN_ENV: &str = "HF_API_TOKEN";

/// Build an HTTP client with the given request timeout.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// POST `body` as JSON and parse a JSON response, retrying transient
/// failures up to `max_retries` times.
pub async fn post_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    body: &Value,
    max_retries: u32,
    label: &str,
) -> Result<Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tracing::debug!(label, attempt, ?delay, "retrying request");
            tokio::time::sleep(delay).await;
        }

        let mut req = client.post(url).json(body);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }

        match req.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                // Rate limited or server error: retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!("{} error {}: {}", label, status, body_text));
                    continue;
                }

                let body_text = response.text().await.unwrap_or_default();
                bail!("{} error {}: {}", label, status, body_text);
            }
            Err(e) => {
                last_err = Some(anyhow::anyhow!("{} request to {} failed: {}", label, url, e));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{} failed after retries", label)))
}

fn token() -> Option<String> {
    std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty())
}

// ============ Answer extraction ============

/// Extractive QA over HTTP.
pub struct RemoteExtractor {
    url: String,
    name: String,
    client: reqwest::Client,
    max_retries: u32,
    token: Option<String>,
}

impl RemoteExtractor {
    pub fn new(config: &AnswerConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("answer.url required for remote provider"))?;
        Ok(Self {
            name: config.model.clone().unwrap_or_else(|| url.clone()),
            url,
            client: http_client(config.timeout_secs)?,
            max_retries: config.max_retries,
            token: token(),
        })
    }
}

#[async_trait]
impl AnswerExtractor for RemoteExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, question: &str, context: &str) -> Result<AnswerSpan> {
        let body = json!({ "inputs": { "question": question, "context": context } });
        let json = post_json_with_retry(
            &self.client,
            &self.url,
            self.token.as_deref(),
            &body,
            self.max_retries,
            "answer model",
        )
        .await?;
        parse_answer_response(&json)
    }
}

/// Parse `{"answer","score","start","end"}`, also accepting it wrapped in
/// a one-element array.
pub fn parse_answer_response(json: &Value) -> Result<AnswerSpan> {
    let obj = match json {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| anyhow::anyhow!("Invalid answer response: empty array"))?,
        other => other,
    };
    if let Some(err) = obj.get("error").and_then(|e| e.as_str()) {
        bail!("answer model error: {}", err);
    }
    let text = obj
        .get("answer")
        .and_then(|a| a.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid answer response: missing answer"))?;
    let score = obj
        .get("score")
        .and_then(|s| s.as_f64())
        .ok_or_else(|| anyhow::anyhow!("Invalid answer response: missing score"))?;
    let start = obj.get("start").and_then(|s| s.as_u64()).unwrap_or(0) as usize;
    let end = obj
        .get("end")
        .and_then(|s| s.as_u64())
        .map(|e| e as usize)
        .unwrap_or(start + text.len());

    Ok(AnswerSpan {
        text: text.to_string(),
        start,
        end,
        confidence: score as f32,
    })
}

// ============ Summarization ============

/// Abstractive or extractive summarization over HTTP.
pub struct RemoteSummarizer {
    url: String,
    name: String,
    client: reqwest::Client,
    max_retries: u32,
    token: Option<String>,
}

impl RemoteSummarizer {
    pub fn new(config: &SummaryConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("summary.url required for remote provider"))?;
        Ok(Self {
            name: config.model.clone().unwrap_or_else(|| url.clone()),
            url,
            client: http_client(config.timeout_secs)?,
            max_retries: config.max_retries,
            token: token(),
        })
    }
}

#[async_trait]
impl Summarizer for RemoteSummarizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let body = json!({ "inputs": text });
        let json = post_json_with_retry(
            &self.client,
            &self.url,
            self.token.as_deref(),
            &body,
            self.max_retries,
            "summary model",
        )
        .await?;
        parse_summary_response(&json)
    }
}

/// Parse `[{"summary_text": ...}]` or `{"summary_text": ...}`.
pub fn parse_summary_response(json: &Value) -> Result<String> {
    let obj = match json {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| anyhow::anyhow!("Invalid summary response: empty array"))?,
        other => other,
    };
    if let Some(err) = obj.get("error").and_then(|e| e.as_str()) {
        bail!("summary model error: {}", err);
    }
    obj.get("summary_text")
        .and_then(|s| s.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid summary response: missing summary_text"))
}
