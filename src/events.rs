//! Event hooks for recovery lifecycle observability.
//!
//! Provides an optional, non-intrusive way to observe a recovery run:
//! each attempt's start and outcome, each repair, and the final result.
//! Implement [`EventHandler`] to receive these for logging or progress UIs.

use std::sync::Arc;

/// Events emitted during a recovery run.
#[derive(Debug, Clone)]
pub enum Event {
    /// An attempt is about to be sent to the endpoint.
    AttemptStart {
        /// Attempt number (1-indexed; 1 is the initial call).
        attempt: u32,
    },
    /// An attempt's response has been cleaned and validated.
    AttemptEnd {
        /// Attempt number (1-indexed).
        attempt: u32,
        /// Whether the response validated.
        ok: bool,
        /// The validation complaint, when `ok` is false.
        error: Option<String>,
    },
    /// A repair prompt is being constructed for the next attempt.
    RepairStart {
        /// The attempt whose failure triggered this repair (1-indexed).
        attempt: u32,
        /// The failure being fed back to the model.
        reason: String,
    },
    /// The recovery run has finished.
    RecoveryEnd {
        /// Total attempts made.
        attempts: u32,
        /// Whether a validated object was produced.
        success: bool,
    },
}

/// Handler for recovery lifecycle events.
///
/// Entirely optional — recovery works without one.
///
/// # Example
///
/// ```
/// use llm_recover::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         if let Event::RepairStart { attempt, reason } = event {
///             eprintln!("attempt {} failed: {}", attempt, reason);
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called for each emitted event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use llm_recover::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     eprintln!("{:?}", event);
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
