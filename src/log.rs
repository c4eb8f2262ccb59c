//! Attempt history for observability and post-mortem diagnosis.
//!
//! Every [`Recovery`](crate::recover::Recovery) call records what each attempt
//! saw: the raw endpoint text, the cleaned text, and the validation error (if
//! any). The log is attached to both successful results and exhausted
//! failures. It is not required for correctness — only for diagnosis and
//! testing.

/// Record of a single recovery attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// The unparsed text returned by the endpoint.
    pub raw: String,
    /// The raw text after the cleaning transform.
    pub cleaned: String,
    /// The parse/validation error for this attempt. `None` means success.
    pub error: Option<String>,
}

impl Attempt {
    /// Quick check: did this attempt validate?
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Ordered sequence of attempts for one recovery call.
#[derive(Debug, Clone, Default)]
pub struct AttemptLog {
    attempts: Vec<Attempt>,
}

impl AttemptLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempt record.
    pub fn push(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    /// Number of attempts recorded.
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// Whether no attempts have been recorded.
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// The most recent attempt, if any.
    pub fn last(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    /// Iterate over attempts in order.
    pub fn iter(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.iter()
    }
}

impl<'a> IntoIterator for &'a AttemptLog {
    type Item = &'a Attempt;
    type IntoIter = std::slice::Iter<'a, Attempt>;

    fn into_iter(self) -> Self::IntoIter {
        self.attempts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_records_in_order() {
        let mut log = AttemptLog::new();
        log.push(Attempt {
            raw: "bad".into(),
            cleaned: "bad".into(),
            error: Some("not JSON".into()),
        });
        log.push(Attempt {
            raw: "{}".into(),
            cleaned: "{}".into(),
            error: None,
        });

        assert_eq!(log.len(), 2);
        assert!(!log.iter().next().unwrap().ok());
        assert!(log.last().unwrap().ok());
    }

    #[test]
    fn test_empty_log() {
        let log = AttemptLog::new();
        assert!(log.is_empty());
        assert!(log.last().is_none());
    }
}
