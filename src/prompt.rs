//! Outbound prompt construction for initial and repair attempts.
//!
//! Plain string building, no template engine. The initial prompt embeds the
//! schema's field-by-field description plus strict formatting rules; the
//! repair prompt feeds the prior failure's exact error and the failing text
//! back to the model.

use crate::schema::Schema;

/// Formatting rules appended to every initial prompt.
const FORMAT_RULES: &str = "\
Rules:\n\
1. Output pure JSON only, with no surrounding text.\n\
2. Do not use markdown code fences.\n\
3. Populate every required field.\n\
4. Strings must be double-quoted.";

/// Build the first outbound text: task description, expected fields, rules.
pub fn initial_prompt(task: &str, schema: &Schema) -> String {
    format!(
        "{}\n\nRespond with a single JSON object containing these fields:\n{}\n{}",
        task.trim(),
        schema.describe_fields().trim_end(),
        FORMAT_RULES
    )
}

/// Build a repair attempt: the exact complaint, the failing cleaned text,
/// and the instruction to return corrected pure JSON only.
pub fn repair_prompt(error: &str, failing_text: &str) -> String {
    format!(
        "Your previous output was invalid.\n\
         Error: {}\n\n\
         Previous output:\n{}\n\n\
         Return the corrected response as pure JSON only, with no other text.",
        error, failing_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn initial_prompt_embeds_task_and_fields() {
        let schema = Schema::new()
            .field("title", FieldType::String, "book title")
            .field("pages", FieldType::Integer, "page count");
        let prompt = initial_prompt("Recommend a science fiction novel.", &schema);

        assert!(prompt.starts_with("Recommend a science fiction novel."));
        assert!(prompt.contains("\"title\" (string, required): book title"));
        assert!(prompt.contains("\"pages\" (integer, required): page count"));
        assert!(prompt.contains("pure JSON only"));
        assert!(prompt.contains("double-quoted"));
    }

    #[test]
    fn repair_prompt_carries_error_and_failing_text() {
        let prompt = repair_prompt("missing required field 'year'", r#"{"name": "x"}"#);
        assert!(prompt.contains("missing required field 'year'"));
        assert!(prompt.contains(r#"{"name": "x"}"#));
        assert!(prompt.contains("pure JSON only"));
    }
}
