/// Event records for the discrete-event scheduler.
///
/// An `Event` is "do X at time T with context C", plus a slot recording
/// what X returned once it ran. Events hold no ordering logic of their
/// own; the queue orders them by `(time, id)`.

use std::fmt;

use crate::error::ActionError;
use crate::scheduler::SchedulerContext;
use crate::time::VirtualTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// A strictly-increasing event identifier, assigned at scheduling time.
///
/// The monotonic nature of `EventId` breaks ties in the queue: two events
/// scheduled at the same `VirtualTime` are ordered by their `EventId`,
/// which corresponds to insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    /// Wrap a raw u64 into an `EventId`.
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    /// Return the raw value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

// ── Event ID Generator ───────────────────────────────────────────────

/// Deterministic, strictly-increasing event-ID generator.
///
/// Each scheduler owns exactly one of these.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    /// Create a generator starting at 0.
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next event ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next ID without consuming it.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Action ────────────────────────────────────────────────────────────

/// The callback run when an event fires.
///
/// It receives a [`SchedulerContext`] so it can schedule follow-up
/// events, and its `Ok` value becomes the event's `result`.
pub type Action<R, C> =
    Box<dyn FnOnce(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError>>;

// ── Event ─────────────────────────────────────────────────────────────

/// A single scheduled unit of simulated work.
///
/// `R` is the value an action produces, `C` the caller's bookkeeping
/// payload. The scheduler stores and returns `context` but never reads it.
///
/// ```
/// use desim::Event;
///
/// let event: Event<i32, &str> = Event::new(10)
///     .with_action(|_ctx| Ok(2018))
///     .with_context("foo");
/// assert_eq!(event.time().value(), 10.0);
/// assert!(event.result().is_none());
/// ```
pub struct Event<R = (), C = ()> {
    time: VirtualTime,
    id: Option<EventId>,
    action: Option<Action<R, C>>,
    context: Option<C>,
    result: Option<R>,
}

impl<R, C> Event<R, C> {
    /// A no-op event due at `time`.
    pub fn new(time: impl Into<VirtualTime>) -> Self {
        Event {
            time: time.into(),
            id: None,
            action: None,
            context: None,
            result: None,
        }
    }

    /// Attach the action to run when the event fires.
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: FnOnce(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Attach an opaque payload.
    pub fn with_context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// The time at which this event fires. Fixed at construction.
    #[inline]
    pub fn time(&self) -> VirtualTime {
        self.time
    }

    /// The id assigned when the event was scheduled.
    #[inline]
    pub fn id(&self) -> Option<EventId> {
        self.id
    }

    /// Whether the event carries an action.
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }

    /// What the action returned; `None` before execution or for no-op events.
    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    /// Take the result out of the event.
    pub fn take_result(&mut self) -> Option<R> {
        self.result.take()
    }

    pub fn into_context(self) -> Option<C> {
        self.context
    }

    pub(crate) fn assign_id(&mut self, id: EventId) {
        self.id = Some(id);
    }

    pub(crate) fn take_action(&mut self) -> Option<Action<R, C>> {
        self.action.take()
    }

    pub(crate) fn set_result(&mut self, result: R) {
        self.result = Some(result);
    }
}

impl<R: fmt::Debug, C: fmt::Debug> fmt::Debug for Event<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("time", &self.time)
            .field("id", &self.id)
            .field("action", &self.action.as_ref().map(|_| "<action>"))
            .field("context", &self.context)
            .field("result", &self.result)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_monotonic() {
        let mut gen = EventIdGen::new();
        let a = gen.next_id();
        let b = gen.next_id();
        let c = gen.next_id();
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert_eq!(c.raw(), 2);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(gen.peek().raw(), 3);
    }

    #[test]
    fn test_new_event_is_inert() {
        let e: Event = Event::new(5);
        assert_eq!(e.time(), VirtualTime::from(5));
        assert!(e.id().is_none());
        assert!(!e.has_action());
        assert!(e.context().is_none());
        assert!(e.result().is_none());
    }

    #[test]
    fn test_event_builder() {
        let mut e: Event<u32, Vec<&str>> = Event::new(2.5)
            .with_action(|_| Ok(7))
            .with_context(vec!["foo", "bar"]);
        assert!(e.has_action());
        assert_eq!(e.context().map(Vec::len), Some(2));
        e.context_mut().unwrap().push("baz");
        assert_eq!(e.into_context().unwrap(), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_event_debug_hides_action() {
        let e: Event<(), &str> = Event::new(1).with_action(|_| Ok(())).with_context("ctx");
        let dbg = format!("{:?}", e);
        assert!(dbg.contains("<action>"));
        assert!(dbg.contains("ctx"));
    }

    #[test]
    fn test_event_id_display() {
        assert_eq!(format!("{}", EventId::new(42)), "E#42");
    }
}
