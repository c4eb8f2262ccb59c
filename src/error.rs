use std::time::Duration;
use thiserror::Error;

use crate::log::AttemptLog;

/// Errors produced by the recovery loop and its collaborators.
#[derive(Error, Debug)]
pub enum RecoverError {
    /// The schema is malformed (fails before any endpoint call).
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The task prompt was empty (fails before any endpoint call).
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("endpoint request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// HTTP error with status code, response body, and optional Retry-After hint.
    ///
    /// Returned by HTTP-backed [`ModelEndpoint`](crate::endpoint::ModelEndpoint)
    /// implementations when the provider returns a non-success status code.
    #[error("endpoint returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code (e.g. 429, 500, 503).
        status: u16,
        /// Response body text.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// Endpoint failure with a descriptive message (non-HTTP transports,
    /// custom endpoints, test doubles).
    #[error("endpoint failed: {0}")]
    Endpoint(String),

    /// The recovery was cancelled via the cancellation flag.
    #[error("recovery was cancelled")]
    Cancelled,

    /// All attempts produced text that failed validation.
    ///
    /// Carries the last cleaning/validation error and the full attempt
    /// history for diagnosis.
    #[error("validation failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        /// Total attempts made (initial call plus repairs).
        attempts: u32,
        /// The error from the final attempt.
        last_error: String,
        /// Ordered record of every attempt.
        log: AttemptLog,
    },

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for RecoverError {
    fn from(err: anyhow::Error) -> Self {
        RecoverError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RecoverError>;
