//! HTTP endpoint for Ollama's native API.
//!
//! [`OllamaEndpoint`] sends outbound text to `/api/generate` and returns the
//! model's complete response. Transport retry (429, 5xx, connection errors)
//! is handled here via [`BackoffConfig`] — the recovery loop above never
//! sees transient transport failures that resolve within the retry budget.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::backoff::{is_retryable, BackoffConfig};
use super::ModelEndpoint;
use crate::error::{RecoverError, Result};

/// Default request timeout for the built-in HTTP client.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Endpoint backed by a local or remote Ollama server.
///
/// # Example
///
/// ```
/// use llm_recover::endpoint::{BackoffConfig, OllamaEndpoint};
///
/// let endpoint = OllamaEndpoint::new("http://localhost:11434")
///     .with_model("llama3.2:3b")
///     .with_temperature(0.1)
///     .with_json_mode(true)
///     .with_backoff(BackoffConfig::none());
/// ```
pub struct OllamaEndpoint {
    client: Client,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    json_mode: bool,
    backoff: BackoffConfig,
}

impl OllamaEndpoint {
    /// Create an endpoint for the given base URL (e.g. `http://localhost:11434`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: "llama3.2:3b".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            json_mode: false,
            backoff: BackoffConfig::none(),
        }
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the generation token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Ask the server for JSON-format output. Lowers the repair rate but
    /// does not remove the need for validation.
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    /// Set the transport retry policy. Default: [`BackoffConfig::none()`].
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the HTTP client (custom timeouts, proxies, pools).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn build_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
            },
        });
        if self.json_mode {
            body["format"] = json!("json");
        }
        body
    }

    /// One request, no retry. Non-success statuses become
    /// [`RecoverError::Http`] with any `Retry-After` hint attached.
    async fn request_once(&self, body: &Value) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let resp = self.client.post(&url).json(body).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body = resp.text().await.unwrap_or_default();
            return Err(RecoverError::Http {
                status: status.as_u16(),
                body,
                retry_after,
            });
        }

        let json_resp: Value = resp.json().await?;
        Ok(json_resp
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string())
    }
}

/// Parse a `Retry-After` header value as integer seconds.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[async_trait]
impl ModelEndpoint for OllamaEndpoint {
    async fn send(&self, text: &str) -> Result<String> {
        let body = self.build_body(text);
        let mut last_error: Option<RecoverError> = None;

        for attempt in 0..=self.backoff.max_retries {
            if attempt > 0 {
                let delay = match &last_error {
                    Some(RecoverError::Http {
                        retry_after: Some(ra),
                        ..
                    }) if self.backoff.respect_retry_after => *ra,
                    _ => self.backoff.delay_for_attempt(attempt - 1),
                };
                tokio::time::sleep(delay).await;
            }

            match self.request_once(&body).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if attempt < self.backoff.max_retries && is_retryable(&e, &self.backoff) {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RecoverError::Other("backoff loop exited unexpectedly".into())))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
