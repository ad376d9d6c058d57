//! Handle passed to an event action while it runs.

use crate::error::{ActionError, SchedulerResult};
use crate::event::{Event, EventId};
use crate::queue::EventQueue;
use crate::time::VirtualTime;

use super::{admit, arm_periodic, SchedulerState};

/// Mutable context given to an action on every execution.
///
/// Provides the action with:
/// - the current virtual time
/// - the ability to schedule follow-up events
///
/// The context borrows the pending queue mutably, so an action cannot
/// interfere with dispatch ordering outside of the schedule API. The
/// scheduler is always active while an action runs, so everything
/// scheduled here must be at or after [`SchedulerContext::now`].
pub struct SchedulerContext<'a, R, C> {
    pub(crate) queue: &'a mut EventQueue<R, C>,
    pub(crate) now: VirtualTime,
}

impl<'a, R: 'static, C: 'static> SchedulerContext<'a, R, C> {
    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    /// Schedule an event at its absolute time.
    pub fn schedule(&mut self, event: Event<R, C>) -> SchedulerResult<EventId> {
        admit(self.queue, event, self.now, SchedulerState::Active)
    }

    /// Schedule `action` to run `delay` after now.
    pub fn timeout<F>(&mut self, delay: impl Into<VirtualTime>, action: F) -> SchedulerResult<EventId>
    where
        F: FnOnce(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError> + 'static,
    {
        let at = self.now.plus(delay);
        self.schedule(Event::new(at).with_action(action))
    }

    pub fn timeout_with_context<F>(
        &mut self,
        delay: impl Into<VirtualTime>,
        action: F,
        context: C,
    ) -> SchedulerResult<EventId>
    where
        F: FnOnce(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError> + 'static,
    {
        let at = self.now.plus(delay);
        self.schedule(Event::new(at).with_action(action).with_context(context))
    }

    pub fn timeout_empty(&mut self, delay: impl Into<VirtualTime>) -> SchedulerResult<EventId> {
        let at = self.now.plus(delay);
        self.schedule(Event::new(at))
    }

    /// Run `action` at `now + delay` and then every `interval`.
    pub fn periodic<F>(
        &mut self,
        delay: impl Into<VirtualTime>,
        interval: impl Into<VirtualTime>,
        action: F,
    ) -> SchedulerResult<EventId>
    where
        F: FnMut(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError> + 'static,
    {
        arm_periodic(
            self.queue,
            self.now,
            SchedulerState::Active,
            delay.into(),
            interval.into(),
            action,
        )
    }

    /// Number of pending events, not counting the one running.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Time of the next pending event.
    pub fn peek_time(&self) -> Option<VirtualTime> {
        self.queue.peek_time()
    }
}
