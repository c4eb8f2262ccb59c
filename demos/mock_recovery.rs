//! Deterministic walkthrough of the recovery loop using a mock endpoint.
//!
//! The first canned response is fenced and malformed; the second is valid.
//! An event handler prints each step so you can watch the repair happen.
//!
//! Run with: `cargo run --example mock_recovery`

use std::sync::Arc;

use llm_recover::{Event, FieldType, FnEventHandler, MockEndpoint, Recovery, Schema};

#[tokio::main]
async fn main() -> llm_recover::Result<()> {
    let schema = Schema::new()
        .field("title", FieldType::String, "book title")
        .field("author", FieldType::String, "author's full name")
        .field("pages", FieldType::Integer, "page count")
        .optional("genre", FieldType::String, "primary genre");

    // A chatty model: fences its output, uses unquoted keys, drops a field.
    let mock = MockEndpoint::new(vec![
        "Sure! Here you go:\n```json\n{title: 'Dune', author: 'Frank Herbert'}\n```".to_string(),
        r#"{"title": "Dune", "author": "Frank Herbert"}"#.to_string(),
        r#"{"title": "Dune", "author": "Frank Herbert", "pages": 412, "genre": "science fiction"}"#
            .to_string(),
    ]);

    let result = Recovery::new(3)
        .with_event_handler(Arc::new(FnEventHandler(|event| match event {
            Event::AttemptStart { attempt } => println!("attempt {attempt} ..."),
            Event::AttemptEnd { attempt, ok, error } => {
                if ok {
                    println!("attempt {attempt}: valid");
                } else {
                    println!("attempt {attempt}: {}", error.unwrap_or_default());
                }
            }
            Event::RepairStart { reason, .. } => println!("  repairing: {reason}"),
            Event::RecoveryEnd { attempts, success } => {
                println!("finished after {attempts} attempt(s), success = {success}")
            }
        })))
        .recover("Describe the novel Dune.", &schema, &mock)
        .await?;

    println!("\nvalidated object: {:#?}", result.value);
    println!("endpoint calls: {}", mock.calls());

    for (i, attempt) in result.log.iter().enumerate() {
        println!(
            "attempt {}: {}",
            i + 1,
            attempt.error.as_deref().unwrap_or("ok")
        );
    }

    Ok(())
}
