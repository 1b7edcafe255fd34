//! HTTP API server.
//!
//! Exposes ingestion, question answering and summarization as a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/status` | Index readiness and indexed documents |
//! | `POST` | `/api/ingest/text` | `{text, title?, mode?}` |
//! | `POST` | `/api/ingest/file` | `{filename, content_base64, title?, mode?}` |
//! | `POST` | `/api/ingest/url` | `{url, title?, mode?}` |
//! | `POST` | `/api/ask` | `{question, top_k?}` |
//! | `POST` | `/api/reset` | Empty the index |
//! | `POST` | `/api/summarize` | `{text}` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "index_not_ready", "message": "index is not ready: ingest a document first" } }
//! ```
//!
//! | Status | Codes |
//! |--------|-------|
//! | 400 | `bad_request`, `empty_document`, `unsupported_format`, `parse_error` |
//! | 408 | `timeout` |
//! | 409 | `index_not_ready` |
//! | 422 | `all_extractions_failed` |
//! | 500 | `embedding_error`, `dimension_mismatch`, `summarization_error`, `extraction_error`, `persistence_error` |
//!
//! An ingest whose index stage failed answers with the error status and
//! carries the partial report next to the error:
//! `{"error": {...}, "report": {...}}`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use docqa_core::{Answer, IndexStatus, IngestMode, IngestReport, QaError, StageOutcome};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::engine::Engine;
use crate::extract::Artifact;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    engine: Arc<Engine>,
}

impl AppState {
    pub fn new(config: Arc<Config>, engine: Arc<Engine>) -> Self {
        Self { config, engine }
    }
}

/// Starts the HTTP server on `[server].bind`.
///
/// Builds the [`Engine`] (restoring any persisted index) and serves until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let engine = Arc::new(Engine::from_config(config)?);
    let state = AppState::new(Arc::new(config.clone()), engine);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind = %bind_addr, "server listening");
    println!("docqa server listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Build the router for `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Base64 inflates uploads by a third; leave room for the JSON envelope.
    let body_limit = state.config.extract.max_upload_bytes / 3 * 4 + 64 * 1024;

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/status", get(handle_status))
        .route("/api/ingest/text", post(handle_ingest_text))
        .route("/api/ingest/file", post(handle_ingest_file))
        .route("/api/ingest/url", post(handle_ingest_url))
        .route("/api/ask", post(handle_ask))
        .route("/api/reset", post(handle_reset))
        .route("/api/summarize", post(handle_summarize))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<IngestReport>,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    report: Option<IngestReport>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
            report: self.report,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
        report: None,
    }
}

fn status_for(err: &QaError) -> StatusCode {
    match err {
        QaError::IndexNotReady => StatusCode::CONFLICT,
        QaError::AllExtractionsFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        QaError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<QaError> for AppError {
    fn from(err: QaError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(code = err.code(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
            report: None,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

/// Run `fut` under the configured request timeout.
async fn bounded<T>(
    state: &AppState,
    fut: impl Future<Output = Result<T, QaError>>,
) -> Result<T, AppError> {
    let secs = state.config.server.request_timeout_secs;
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(QaError::Timeout(secs).into()),
    }
}

fn parse_mode(mode: Option<&str>) -> Result<IngestMode, AppError> {
    match mode {
        None => Ok(IngestMode::default()),
        Some(m) => m.parse().map_err(AppError::from),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/status ============

async fn handle_status(State(state): State<AppState>) -> Json<IndexStatus> {
    Json(state.engine.status())
}

// ============ POST /api/ingest/* ============

#[derive(Deserialize)]
struct IngestTextRequest {
    text: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Deserialize)]
struct IngestFileRequest {
    filename: String,
    content_base64: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Deserialize)]
struct IngestUrlRequest {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

async fn handle_ingest_text(
    State(state): State<AppState>,
    body: Result<Json<IngestTextRequest>, JsonRejection>,
) -> Result<Json<IngestReport>, AppError> {
    let Json(req) = body?;
    let mode = parse_mode(req.mode.as_deref())?;
    let artifact = Artifact::Text {
        text: req.text,
        title: req.title.clone(),
    };
    run_ingest(&state, artifact, req.title, mode).await
}

async fn handle_ingest_file(
    State(state): State<AppState>,
    body: Result<Json<IngestFileRequest>, JsonRejection>,
) -> Result<Json<IngestReport>, AppError> {
    let Json(req) = body?;
    let mode = parse_mode(req.mode.as_deref())?;
    if req.filename.trim().is_empty() {
        return Err(bad_request("filename must not be empty"));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(req.content_base64.trim())
        .map_err(|e| bad_request(format!("content_base64 is not valid base64: {}", e)))?;
    let artifact = Artifact::File {
        name: req.filename,
        bytes,
    };
    run_ingest(&state, artifact, req.title, mode).await
}

async fn handle_ingest_url(
    State(state): State<AppState>,
    body: Result<Json<IngestUrlRequest>, JsonRejection>,
) -> Result<Json<IngestReport>, AppError> {
    let Json(req) = body?;
    let mode = parse_mode(req.mode.as_deref())?;
    if req.url.trim().is_empty() {
        return Err(bad_request("url must not be empty"));
    }
    run_ingest(&state, Artifact::Url(req.url), req.title, mode).await
}

async fn run_ingest(
    state: &AppState,
    artifact: Artifact,
    title: Option<String>,
    mode: IngestMode,
) -> Result<Json<IngestReport>, AppError> {
    let mut report = bounded(state, state.engine.ingest_artifact(artifact, title, mode)).await?;

    if let StageOutcome::Failed { .. } = report.index {
        let err = report
            .index_error
            .take()
            .unwrap_or_else(|| QaError::Embedding("index stage failed".to_string()));
        let mut app_err = AppError::from(err);
        app_err.report = Some(report);
        return Err(app_err);
    }
    Ok(Json(report))
}

// ============ POST /api/ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

async fn handle_ask(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Answer>, AppError> {
    let Json(req) = body?;
    let answer = bounded(&state, state.engine.ask(&req.question, req.top_k)).await?;
    Ok(Json(answer))
}

// ============ POST /api/reset ============

async fn handle_reset(State(state): State<AppState>) -> Json<IndexStatus> {
    Json(state.engine.reset().await)
}

// ============ POST /api/summarize ============

#[derive(Deserialize)]
struct SummarizeRequest {
    #[serde(alias = "query")]
    text: String,
}

#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
}

async fn handle_summarize(
    State(state): State<AppState>,
    body: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let Json(req) = body?;
    let summary = bounded(&state, state.engine.summarize(&req.text)).await?;
    Ok(Json(SummarizeResponse { summary }))
}
