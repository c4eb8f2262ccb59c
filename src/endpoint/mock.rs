//! Mock endpoint for testing without a live model.
//!
//! [`MockEndpoint`] plays back canned responses in order, cycling when
//! exhausted, and counts how many times it was called — which is exactly
//! what the recovery loop's attempt-count guarantees are tested against.
//! [`MockEndpoint::failing`] simulates a transport failure.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::ModelEndpoint;
use crate::error::{RecoverError, Result};

enum Script {
    Responses(Vec<String>),
    Failure(String),
}

/// A test endpoint that returns canned responses in order.
///
/// # Example
///
/// ```
/// use llm_recover::endpoint::MockEndpoint;
///
/// let mock = MockEndpoint::new(vec![
///     "not json".to_string(),
///     r#"{"title": "Foo", "pages": 120}"#.to_string(),
/// ]);
/// assert_eq!(mock.calls(), 0);
/// ```
pub struct MockEndpoint {
    script: Script,
    calls: AtomicUsize,
}

impl MockEndpoint {
    /// Canned responses, returned in order. Cycles when exhausted.
    pub fn new(responses: Vec<String>) -> Self {
        assert!(
            !responses.is_empty(),
            "MockEndpoint requires at least one response"
        );
        Self {
            script: Script::Responses(responses),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Always fail with a transport error carrying the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Failure(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `send` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ModelEndpoint for MockEndpoint {
    async fn send(&self, _text: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.script {
            Script::Responses(responses) => Ok(responses[call % responses.len()].clone()),
            Script::Failure(message) => Err(RecoverError::Endpoint(message.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
