//! # llm-recover
//!
//! Structured response recovery for LLM output: ask a model for a JSON
//! object matching a schema, and when the reply comes back fenced, chatty,
//! or missing fields, repair it through bounded re-prompting instead of
//! giving up.
//!
//! ## Core concepts
//!
//! - **[`Schema`]**: the fields the response must contain, with types,
//!   descriptions, and required/optional markers. Nested objects and typed
//!   lists are supported.
//! - **[`ModelEndpoint`]**: an opaque `send(text) -> text` service.
//!   [`OllamaEndpoint`] talks to a real server; [`MockEndpoint`] plays back
//!   canned responses for tests.
//! - **[`Recovery`]**: the loop. It builds a schema-guided prompt, cleans
//!   the raw reply (fence stripping, brace slicing, whitespace collapse),
//!   validates it against the schema, and on failure sends a repair prompt
//!   carrying the exact validation complaint. Up to `max_retries` repairs,
//!   then [`RecoverError::Exhausted`] with the full [`AttemptLog`].
//!
//! Transport failures are never repaired by the loop; they propagate
//! immediately. Endpoints may retry transport errors internally via
//! [`BackoffConfig`].
//!
//! ## Quick start
//!
//! ```no_run
//! use llm_recover::{recover, FieldType, MockEndpoint, Schema};
//!
//! #[tokio::main]
//! async fn main() -> llm_recover::Result<()> {
//!     let schema = Schema::new()
//!         .field("title", FieldType::String, "book title")
//!         .field("pages", FieldType::Integer, "page count");
//!
//!     let endpoint = MockEndpoint::new(vec![
//!         "```json\n{title: 'Foo'}\n```".to_string(),
//!         r#"{"title": "Foo", "pages": 120}"#.to_string(),
//!     ]);
//!
//!     let recovered = recover("Describe a short book.", &schema, &endpoint, 2).await?;
//!     assert_eq!(recovered.attempts, 2);
//!     println!("{:?}", recovered.value);
//!     Ok(())
//! }
//! ```

pub mod clean;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod log;
pub mod prompt;
pub mod recover;
pub mod schema;
pub mod validate;

pub use clean::clean;
pub use endpoint::{BackoffConfig, MockEndpoint, ModelEndpoint, OllamaEndpoint};
pub use error::{RecoverError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use log::{Attempt, AttemptLog};
pub use recover::{recover, Recovered, Recovery};
pub use schema::{Field, FieldType, Schema};
pub use validate::{parse_and_validate, validate, ValidationError};
