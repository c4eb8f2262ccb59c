//! Structured recovery against a live Ollama server.
//!
//! Requires Ollama running locally with the model pulled:
//! `ollama pull llama3.2:3b`
//!
//! Run with: `cargo run --example basic_recovery`

use llm_recover::{recover, FieldType, OllamaEndpoint, Schema};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Movie {
    title: String,
    director: String,
    year: i64,
    rating: f64,
}

#[tokio::main]
async fn main() -> llm_recover::Result<()> {
    let schema = Schema::new()
        .field("title", FieldType::String, "movie title")
        .field("director", FieldType::String, "director's full name")
        .field("year", FieldType::Integer, "release year")
        .field("rating", FieldType::Float, "critical rating from 0.0 to 10.0");

    let endpoint = OllamaEndpoint::new("http://localhost:11434")
        .with_model("llama3.2:3b")
        .with_temperature(0.3);

    let result = recover(
        "Recommend one classic science fiction movie.",
        &schema,
        &endpoint,
        2,
    )
    .await?;

    println!("recovered in {} attempt(s)", result.attempts);

    let movie: Movie = result.parse_as()?;
    println!(
        "{} ({}) by {}, rated {}",
        movie.title, movie.year, movie.director, movie.rating
    );

    Ok(())
}
