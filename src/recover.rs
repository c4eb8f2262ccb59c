//! The structured-output recovery loop.
//!
//! [`Recovery`] turns a free-text model response into a validated object:
//! it embeds the schema into the outbound prompt, sends it, cleans and
//! validates the response, and — on failure — feeds the exact validation
//! complaint back to the model, up to a bounded number of repair attempts.
//!
//! Attempts are strictly sequential; each blocks on the endpoint before the
//! next begins. Transport failures propagate immediately and are never
//! retried here (see [`endpoint`](crate::endpoint) for endpoint-level
//! retry). Separate recovery calls share no mutable state and may run
//! concurrently.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    clean::clean,
    endpoint::ModelEndpoint,
    error::{RecoverError, Result},
    events::{emit, Event, EventHandler},
    log::{Attempt, AttemptLog},
    prompt, validate,
    schema::Schema,
};

/// A validated recovery result.
#[derive(Debug, Clone)]
pub struct Recovered {
    /// The validated field-to-value mapping.
    pub value: Map<String, Value>,
    /// Total attempts made (1 = first call succeeded, no repairs).
    pub attempts: u32,
    /// Ordered record of every attempt, including the successful one.
    pub log: AttemptLog,
}

impl Recovered {
    /// Extract the validated object into a typed `T`.
    ///
    /// ```ignore
    /// let recovered = recovery.recover(prompt, &schema, &endpoint).await?;
    /// let book: Book = recovered.parse_as()?;
    /// ```
    pub fn parse_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.value.clone())).map_err(|e| {
            RecoverError::Other(format!(
                "failed to parse validated object into target type: {}",
                e
            ))
        })
    }
}

/// Configurable recovery runner.
///
/// # Example
///
/// ```no_run
/// use llm_recover::endpoint::OllamaEndpoint;
/// use llm_recover::recover::Recovery;
/// use llm_recover::schema::{FieldType, Schema};
///
/// #[tokio::main]
/// async fn main() -> llm_recover::Result<()> {
///     let schema = Schema::new()
///         .field("title", FieldType::String, "book title")
///         .field("pages", FieldType::Integer, "page count");
///     let endpoint = OllamaEndpoint::new("http://localhost:11434");
///
///     let recovered = Recovery::new(2)
///         .recover("Recommend a science fiction novel.", &schema, &endpoint)
///         .await?;
///     println!("{} attempts: {:?}", recovered.attempts, recovered.value);
///     Ok(())
/// }
/// ```
pub struct Recovery {
    /// Repair attempts allowed after the first try. 0 = exactly one attempt.
    max_retries: u32,
    cancellation: Option<Arc<AtomicBool>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Recovery {
    /// Allow up to `max_retries` repair attempts after the initial call.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            cancellation: None,
            event_handler: None,
        }
    }

    /// Set a cancellation flag, checked before each send. An in-flight send
    /// is not interrupted.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Set an event handler for lifecycle observability.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// The configured repair budget.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn check_cancelled(&self) -> Result<()> {
        let cancelled = self
            .cancellation
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed));
        if cancelled {
            return Err(RecoverError::Cancelled);
        }
        Ok(())
    }

    /// Run the recovery protocol for one prompt against one schema.
    ///
    /// Returns the validated object, or:
    /// - [`RecoverError::InvalidSchema`] / [`RecoverError::EmptyPrompt`]
    ///   before any endpoint call,
    /// - a transport error from the endpoint, propagated immediately,
    /// - [`RecoverError::Exhausted`] when every attempt failed validation.
    pub async fn recover(
        &self,
        task: &str,
        schema: &Schema,
        endpoint: &dyn ModelEndpoint,
    ) -> Result<Recovered> {
        if task.trim().is_empty() {
            return Err(RecoverError::EmptyPrompt);
        }
        schema.ensure_valid()?;

        let total_attempts = self.max_retries + 1;
        let mut outbound = prompt::initial_prompt(task, schema);
        let mut log = AttemptLog::new();

        for attempt in 1..=total_attempts {
            self.check_cancelled()?;
            emit(&self.event_handler, Event::AttemptStart { attempt });

            let raw = match endpoint.send(&outbound).await {
                Ok(raw) => raw,
                Err(e) => {
                    emit(
                        &self.event_handler,
                        Event::RecoveryEnd {
                            attempts: attempt,
                            success: false,
                        },
                    );
                    return Err(e);
                }
            };

            let cleaned = clean(&raw);
            match validate::parse_and_validate(&cleaned, schema) {
                Ok(value) => {
                    log.push(Attempt {
                        raw,
                        cleaned,
                        error: None,
                    });
                    emit(
                        &self.event_handler,
                        Event::AttemptEnd {
                            attempt,
                            ok: true,
                            error: None,
                        },
                    );
                    emit(
                        &self.event_handler,
                        Event::RecoveryEnd {
                            attempts: attempt,
                            success: true,
                        },
                    );
                    return Ok(Recovered {
                        value,
                        attempts: attempt,
                        log,
                    });
                }
                Err(e) => {
                    let reason = e.to_string();
                    log.push(Attempt {
                        raw,
                        cleaned: cleaned.clone(),
                        error: Some(reason.clone()),
                    });
                    emit(
                        &self.event_handler,
                        Event::AttemptEnd {
                            attempt,
                            ok: false,
                            error: Some(reason.clone()),
                        },
                    );

                    if attempt < total_attempts {
                        emit(
                            &self.event_handler,
                            Event::RepairStart {
                                attempt,
                                reason: reason.clone(),
                            },
                        );
                        outbound = prompt::repair_prompt(&reason, &cleaned);
                    } else {
                        emit(
                            &self.event_handler,
                            Event::RecoveryEnd {
                                attempts: attempt,
                                success: false,
                            },
                        );
                        return Err(RecoverError::Exhausted {
                            attempts: attempt,
                            last_error: reason,
                            log,
                        });
                    }
                }
            }
        }

        // total_attempts >= 1, so the loop always returns.
        Err(RecoverError::Other("recovery loop exited unexpectedly".into()))
    }
}

/// One-shot convenience wrapper around [`Recovery::recover`].
pub async fn recover(
    task: &str,
    schema: &Schema,
    endpoint: &dyn ModelEndpoint,
    max_retries: u32,
) -> Result<Recovered> {
    Recovery::new(max_retries)
        .recover(task, schema, endpoint)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::MockEndpoint;
    use crate::events::FnEventHandler;
    use crate::schema::FieldType;
    use serde::Deserialize;
    use std::sync::Mutex;

    fn book_schema() -> Schema {
        Schema::new()
            .field("title", FieldType::String, "book title")
            .field("pages", FieldType::Integer, "page count")
    }

    const VALID: &str = r#"{"title": "Foo", "pages": 120}"#;

    #[tokio::test]
    async fn first_call_success_no_repairs() {
        let mock = MockEndpoint::fixed(VALID);
        let result = recover("Describe a book.", &book_schema(), &mock, 3)
            .await
            .unwrap();
        assert_eq!(result.attempts, 1);
        assert_eq!(result.value["title"], "Foo");
        assert_eq!(result.log.len(), 1);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn k_failures_then_success() {
        // Two invalid responses, then a valid one; budget allows three repairs.
        let mock = MockEndpoint::new(vec![
            "not json".into(),
            r#"{"title": "Foo"}"#.into(),
            VALID.into(),
        ]);
        let result = recover("Describe a book.", &book_schema(), &mock, 3)
            .await
            .unwrap();
        assert_eq!(result.attempts, 3);
        assert_eq!(result.value["pages"], 120);
        assert_eq!(mock.calls(), 3);
        assert_eq!(result.log.len(), 3);
        assert!(!result.log.iter().next().unwrap().ok());
        assert!(result.log.last().unwrap().ok());
    }

    #[tokio::test]
    async fn exhausted_makes_exactly_max_retries_plus_one_sends() {
        let mock = MockEndpoint::fixed("still not json");
        let err = recover("Describe a book.", &book_schema(), &mock, 2)
            .await
            .unwrap_err();
        assert_eq!(mock.calls(), 3);
        match err {
            RecoverError::Exhausted {
                attempts,
                last_error,
                log,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("not valid JSON"));
                assert_eq!(log.len(), 3);
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_retries_means_one_attempt() {
        let mock = MockEndpoint::fixed("nope");
        let err = recover("Describe a book.", &book_schema(), &mock, 0)
            .await
            .unwrap_err();
        assert_eq!(mock.calls(), 1);
        assert!(matches!(err, RecoverError::Exhausted { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn endpoint_failure_propagates_immediately() {
        let mock = MockEndpoint::failing("connection refused");
        let err = recover("Describe a book.", &book_schema(), &mock, 5)
            .await
            .unwrap_err();
        // No repair attempt for a transport failure.
        assert_eq!(mock.calls(), 1);
        assert!(matches!(err, RecoverError::Endpoint(_)));
    }

    #[tokio::test]
    async fn invalid_schema_fails_before_any_send() {
        let mock = MockEndpoint::fixed(VALID);
        let schema = Schema::new().optional("note", FieldType::String, "note");
        let err = recover("Do a thing.", &schema, &mock, 1).await.unwrap_err();
        assert!(matches!(err, RecoverError::InvalidSchema(_)));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn empty_prompt_fails_before_any_send() {
        let mock = MockEndpoint::fixed(VALID);
        let err = recover("   ", &book_schema(), &mock, 1).await.unwrap_err();
        assert!(matches!(err, RecoverError::EmptyPrompt));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn missing_field_reported_in_repair_reason() {
        let mock = MockEndpoint::new(vec![r#"{"title": "Foo"}"#.into(), VALID.into()]);
        let reasons: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reasons.clone();

        let result = Recovery::new(1)
            .with_event_handler(Arc::new(FnEventHandler(move |event| {
                if let Event::RepairStart { reason, .. } = event {
                    sink.lock().unwrap().push(reason);
                }
            })))
            .recover("Describe a book.", &book_schema(), &mock)
            .await
            .unwrap();

        assert_eq!(result.attempts, 2);
        let reasons = reasons.lock().unwrap();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("pages"));
    }

    #[tokio::test]
    async fn fenced_malformed_then_valid_end_to_end() {
        // The first response is fenced and malformed; the repair succeeds.
        let mock = MockEndpoint::new(vec![
            "```json\n{title: 'Foo'}\n```".into(),
            VALID.into(),
        ]);
        let result = recover("Describe a book.", &book_schema(), &mock, 1)
            .await
            .unwrap();
        assert_eq!(result.attempts, 2);
        assert_eq!(result.value["title"], "Foo");
        assert_eq!(result.value["pages"], 120);
        // The log holds the cleaned (unfenced) text the repair prompt saw.
        let first = result.log.iter().next().unwrap();
        assert_eq!(first.cleaned, "{title: 'Foo'}");
        assert!(first.error.is_some());
    }

    #[tokio::test]
    async fn cancellation_checked_before_send() {
        let mock = MockEndpoint::fixed(VALID);
        let flag = Arc::new(AtomicBool::new(true));
        let err = Recovery::new(2)
            .with_cancellation(flag)
            .recover("Describe a book.", &book_schema(), &mock)
            .await
            .unwrap_err();
        assert!(matches!(err, RecoverError::Cancelled));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn event_sequence_for_successful_repair() {
        let mock = MockEndpoint::new(vec!["garbage".into(), VALID.into()]);
        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        Recovery::new(1)
            .with_event_handler(Arc::new(FnEventHandler(move |event| {
                let tag = match event {
                    Event::AttemptStart { attempt } => format!("start:{}", attempt),
                    Event::AttemptEnd { attempt, ok, .. } => format!("end:{}:{}", attempt, ok),
                    Event::RepairStart { attempt, .. } => format!("repair:{}", attempt),
                    Event::RecoveryEnd { attempts, success } => {
                        format!("done:{}:{}", attempts, success)
                    }
                };
                sink.lock().unwrap().push(tag);
            })))
            .recover("Describe a book.", &book_schema(), &mock)
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start:1",
                "end:1:false",
                "repair:1",
                "start:2",
                "end:2:true",
                "done:2:true"
            ]
        );
    }

    #[tokio::test]
    async fn parse_as_extracts_typed_object() {
        #[derive(Debug, Deserialize)]
        struct Book {
            title: String,
            pages: u32,
        }

        let mock = MockEndpoint::fixed(VALID);
        let result = recover("Describe a book.", &book_schema(), &mock, 0)
            .await
            .unwrap();
        let book: Book = result.parse_as().unwrap();
        assert_eq!(book.title, "Foo");
        assert_eq!(book.pages, 120);
    }

    #[tokio::test]
    async fn nested_schema_end_to_end() {
        let address = Schema::new()
            .field("city", FieldType::String, "city")
            .field("zipcode", FieldType::String, "postal code");
        let schema = Schema::new()
            .field("name", FieldType::String, "full name")
            .field("address", FieldType::Object(address), "mailing address")
            .field(
                "hobbies",
                FieldType::List(Box::new(FieldType::String)),
                "hobby list",
            );

        let mock = MockEndpoint::new(vec![
            // Missing nested field first, then complete.
            r#"{"name": "Wei", "address": {"city": "Beijing"}, "hobbies": []}"#.into(),
            concat!(
                r#"{"name": "Wei", "address": {"city": "Beijing", "zipcode": "100000"},"#,
                r#" "hobbies": ["climbing"]}"#
            )
            .into(),
        ]);

        let result = recover("Generate a fictional person.", &schema, &mock, 1)
            .await
            .unwrap();
        assert_eq!(result.attempts, 2);
        assert_eq!(result.value["address"]["zipcode"], "100000");
        let first_error = result.log.iter().next().unwrap().error.as_ref().unwrap();
        assert!(first_error.contains("address.zipcode"));
    }
}
