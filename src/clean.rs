//! Deterministic cleaning transform applied to raw endpoint text.
//!
//! [`clean`] normalizes the noise LLMs wrap around JSON payloads — markdown
//! fences, a stray leading `json` tag, surrounding commentary — without ever
//! mutating the payload itself. The transform is idempotent:
//! `clean(clean(x)) == clean(x)` for all `x`. Text with no recoverable JSON
//! span passes through (whitespace-collapsed) and fails validation
//! downstream, which is what triggers a repair cycle.

/// Normalize raw LLM output ahead of parsing.
///
/// Steps, in order:
/// 1. Strip a leading/trailing code-fence marker; a language tag directly
///    after the opening fence is dropped with it.
/// 2. Strip a leading bare `json` token (case-insensitive).
/// 3. Slice to the span from the first `{` to the last `}` when the first
///    precedes the last; otherwise leave the text unchanged.
/// 4. Collapse whitespace runs (including newlines) to single spaces and trim.
///
/// # Examples
///
/// ```
/// use llm_recover::clean::clean;
///
/// let fenced = "```json\n{\"a\": 1}\n```";
/// assert_eq!(clean(fenced), "{\"a\": 1}");
/// assert_eq!(clean(&clean(fenced)), clean(fenced));
/// ```
pub fn clean(text: &str) -> String {
    let mut t = text.trim();

    // Trailing fence first so a lone "```" pair does not confuse the scan.
    if let Some(rest) = t.strip_suffix("```") {
        t = rest.trim_end();
    }

    if let Some(rest) = t.strip_prefix("```") {
        // Language tag sits directly after the opening fence.
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        t = rest.trim_start();
    }

    t = strip_json_tag(t);

    if let (Some(start), Some(end)) = (t.find('{'), t.rfind('}')) {
        if start < end {
            t = &t[start..=end];
        }
    }

    t.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip a leading bare `json` word (any case) when it stands alone.
fn strip_json_tag(t: &str) -> &str {
    if t.len() >= 4 && t.is_char_boundary(4) && t[..4].eq_ignore_ascii_case("json") {
        let boundary = t[4..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric());
        if boundary {
            return t[4..].trim_start();
        }
    }
    t
}
