//! Model endpoint trait and built-in implementations.
//!
//! The recovery loop talks to an opaque text-generation service through
//! [`ModelEndpoint`]: one capability, `send(text) -> text`. Request format,
//! authentication, and transport retry are entirely the implementor's
//! concern. Built-in implementations: [`OllamaEndpoint`] for real use,
//! [`MockEndpoint`] for deterministic tests.

pub mod backoff;
pub mod mock;
pub mod ollama;

pub use backoff::{is_retryable, BackoffConfig, JitterStrategy};
pub use mock::MockEndpoint;
pub use ollama::OllamaEndpoint;

use crate::error::Result;
use async_trait::async_trait;

/// Opaque remote text-generation service.
///
/// Implementations must be safely reusable across concurrent recovery calls
/// (stateless request/response, or pooled internally).
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `&dyn ModelEndpoint`
/// or `Arc<dyn ModelEndpoint>`.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// Send outbound text, return the model's complete response text.
    ///
    /// A transport failure here is terminal for the whole recovery call —
    /// the recovery loop never retries it. Implementations that want
    /// transport retry do it internally (see
    /// [`BackoffConfig`] on [`OllamaEndpoint`]).
    async fn send(&self, text: &str) -> Result<String>;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str;
}
