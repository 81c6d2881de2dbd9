//! Error types for the `timeline-rag` crate.

use thiserror::Error;

use crate::completion::ModelTier;

/// Errors that can occur while answering a question about a work record.
///
/// Only provider-level failures, configuration problems and cancellation are
/// represented here. Empty retrieval results and unexpected classifier output
/// are absorbed by the session and never surface as errors.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding provider could not embed text, or returned malformed vectors.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion provider could not generate text at the requested tier.
    #[error("Completion error ({provider}, {tier} tier): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// The model tier the request was sent to.
        tier: ModelTier,
        /// A description of the failure.
        message: String,
    },

    /// A provider call did not finish in time.
    #[error("Timeout ({provider}): {operation} did not complete in time")]
    Timeout {
        /// The provider that timed out.
        provider: String,
        /// The operation that was in flight, e.g. `embed` or `complete`.
        operation: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller abandoned the question before an answer was produced.
    #[error("Request cancelled")]
    Cancelled,
}

impl RagError {
    /// Whether re-issuing the same `ask` may succeed.
    ///
    /// Provider failures and timeouts leave the session untouched, so a retry is
    /// always safe. Configuration errors and cancellation are not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RagError::EmbeddingError { .. }
                | RagError::CompletionError { .. }
                | RagError::Timeout { .. }
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
