//! Structured error types for the scheduler.
//!
//! All fallible public APIs return `Result<T, SchedulerError>`. Callers
//! can tell a wrong-type input (`ErrorKind::Type`) from an attempt to
//! rewrite the past (`ErrorKind::Value`) without matching on every
//! variant, and failures raised by event actions pass through untouched.

use crate::time::VirtualTime;

/// Error returned by an event action.
///
/// Boxed so actions can `?` any error type, including a `SchedulerError`
/// from a nested `timeout` call.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of a [`SchedulerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input has the wrong type or is not a usable number.
    Type,
    /// The input is well-typed but violates causality.
    Value,
    /// The scheduler cannot perform the request in its current state.
    State,
    /// An event action failed.
    Action,
    /// A configuration could not be parsed or validated.
    Config,
    /// An exported trace could not be parsed.
    Format,
}

/// The top-level error type for the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    // ── Type errors ───────────────────────────────────────

    /// A dynamically supplied value was not an `Event`.
    #[error("expected an Event, got a value of another type")]
    NotAnEvent,

    /// The timestamp is not a number.
    #[error("event time {time} is not a valid timestamp")]
    InvalidTime { time: f64 },

    // ── Value errors ──────────────────────────────────────

    /// Attempted to schedule an event in the past of an active scheduler.
    #[error("cannot schedule event at {requested} when current time is {current}")]
    NonCausalEvent {
        requested: VirtualTime,
        current: VirtualTime,
    },

    /// A periodic timer needs a finite, strictly positive interval that
    /// moves the clock forward from where the timer fires.
    #[error("periodic interval must advance the clock, got {interval}")]
    InvalidInterval { interval: VirtualTime },

    // ── State errors ──────────────────────────────────────

    /// Attempted to step a scheduler with no pending events.
    #[error("scheduler has no pending events")]
    SchedulerEmpty,

    // ── Action errors ─────────────────────────────────────

    /// An event action returned an error.
    #[error(transparent)]
    Action(ActionError),

    // ── Config / trace errors ─────────────────────────────

    /// A scheduler configuration could not be parsed or validated.
    #[error("invalid scheduler config: {0}")]
    InvalidConfig(String),

    /// A trace line could not be parsed.
    #[error("malformed trace at line {line}: {reason}")]
    TraceFormat { line: usize, reason: String },
}

impl SchedulerError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::NotAnEvent | SchedulerError::InvalidTime { .. } => ErrorKind::Type,
            SchedulerError::NonCausalEvent { .. } | SchedulerError::InvalidInterval { .. } => {
                ErrorKind::Value
            }
            SchedulerError::SchedulerEmpty => ErrorKind::State,
            SchedulerError::Action(_) => ErrorKind::Action,
            SchedulerError::InvalidConfig(_) => ErrorKind::Config,
            SchedulerError::TraceFormat { .. } => ErrorKind::Format,
        }
    }

    /// The action error, if this error came out of an event action.
    pub fn into_action_error(self) -> Option<ActionError> {
        match self {
            SchedulerError::Action(e) => Some(e),
            _ => None,
        }
    }
}

/// Convenience alias for `Result<T, SchedulerError>`.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_non_causal() {
        let e = SchedulerError::NonCausalEvent {
            requested: VirtualTime::from(3),
            current: VirtualTime::from(10),
        };
        assert!(e.to_string().contains("T=3"));
        assert!(e.to_string().contains("T=10"));
        assert_eq!(e.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_type_kinds() {
        assert_eq!(SchedulerError::NotAnEvent.kind(), ErrorKind::Type);
        let nan = SchedulerError::InvalidTime { time: f64::NAN };
        assert_eq!(nan.kind(), ErrorKind::Type);
        assert!(nan.to_string().contains("NaN"));
    }

    #[test]
    fn test_action_error_is_transparent() {
        let inner: ActionError = "sensor offline".into();
        let e = SchedulerError::Action(inner);
        assert_eq!(e.to_string(), "sensor offline");
        assert_eq!(e.kind(), ErrorKind::Action);
        let back = e.into_action_error().unwrap();
        assert_eq!(back.to_string(), "sensor offline");
    }

    #[test]
    fn test_error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(SchedulerError::SchedulerEmpty);
        assert!(!e.to_string().is_empty());
    }

    #[test]
    fn test_scheduler_error_fits_action_error() {
        // Nested scheduling failures can be `?`-ed out of an action.
        let e: ActionError = SchedulerError::SchedulerEmpty.into();
        assert_eq!(e.to_string(), "scheduler has no pending events");
    }
}
