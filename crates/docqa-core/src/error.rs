//! Error taxonomy for the ingestion and retrieval pipeline.
//!
//! Every failure the core can produce is a typed [`QaError`] variant. The
//! HTTP and CLI layers map variants to responses through [`QaError::code`]
//! rather than inspecting message text.

use thiserror::Error;

/// Errors produced by the core pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QaError {
    /// Caller input rejected before touching shared state.
    #[error("{0}")]
    Validation(String),

    /// The extractor produced no usable text.
    #[error("document contains no extractable text")]
    EmptyDocument,

    /// Vector dimensionality differs from the index (or the query).
    #[error("embedding dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Chunk and vector arrays handed to the index are not parallel.
    #[error("{chunks} chunks but {vectors} vectors")]
    LengthMismatch { chunks: usize, vectors: usize },

    /// Search or ask against an empty index.
    #[error("index is not ready: ingest a document first")]
    IndexNotReady,

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("summarization error: {0}")]
    Summarization(String),

    /// A single answer-extraction call failed.
    #[error("answer extraction error: {0}")]
    Extraction(String),

    /// Every candidate passage failed answer extraction.
    #[error("answer extraction failed for all {attempted} candidate passages")]
    AllExtractionsFailed { attempted: usize },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),
}

impl QaError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            QaError::Validation(_) => "bad_request",
            QaError::EmptyDocument => "empty_document",
            QaError::DimensionMismatch { .. } | QaError::LengthMismatch { .. } => {
                "dimension_mismatch"
            }
            QaError::IndexNotReady => "index_not_ready",
            QaError::UnsupportedFormat(_) => "unsupported_format",
            QaError::Parse(_) => "parse_error",
            QaError::Embedding(_) => "embedding_error",
            QaError::Summarization(_) => "summarization_error",
            QaError::Extraction(_) => "extraction_error",
            QaError::AllExtractionsFailed { .. } => "all_extractions_failed",
            QaError::Persistence(_) => "persistence_error",
            QaError::Timeout(_) => "timeout",
        }
    }

    /// True when the caller can fix the problem by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QaError::Validation(_)
                | QaError::EmptyDocument
                | QaError::IndexNotReady
                | QaError::UnsupportedFormat(_)
                | QaError::Parse(_)
        )
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        QaError::Validation(msg.into())
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, QaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = QaError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: index has 384, got 768"
        );
        assert_eq!(err.code(), "dimension_mismatch");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_validation_is_verbatim() {
        let err = QaError::validation("question must not be empty");
        assert_eq!(err.to_string(), "question must not be empty");
        assert_eq!(err.code(), "bad_request");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_index_not_ready_code() {
        assert_eq!(QaError::IndexNotReady.code(), "index_not_ready");
        assert!(QaError::IndexNotReady.to_string().contains("ingest a document"));
    }

    #[test]
    fn test_all_extractions_failed_display() {
        let err = QaError::AllExtractionsFailed { attempted: 3 };
        assert!(err.to_string().contains("all 3"));
        assert_eq!(err.code(), "all_extractions_failed");
    }
}
