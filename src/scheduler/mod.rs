//! The event scheduler: owns pending events and drives execution.
//!
//! Pops events, advances virtual time, runs their actions. The loop is
//! synchronous and single-threaded, so for a given sequence of
//! `schedule` calls the execution order is always the same.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`context`] | [`SchedulerContext`], the handle given to running actions |
//!
//! # Lifecycle
//!
//! A scheduler starts [`SchedulerState::Inactive`]: events may be
//! scheduled at any time, including before the epoch. The first `step`,
//! run call or explicit [`EventScheduler::activate`] moves it to
//! [`SchedulerState::Active`], after which the clock can only move forward
//! and past-dated events are rejected.

pub mod context;

pub use context::SchedulerContext;

use std::any::Any;
use std::fmt;

use tracing::{debug, info, trace};

use crate::config::SchedulerConfig;
use crate::error::{ActionError, SchedulerError, SchedulerResult};
use crate::event::{Event, EventId};
use crate::queue::EventQueue;
use crate::time::VirtualTime;
use crate::trace::ExecutionTrace;

/// Whether causality is being enforced yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Not started; past-dated events are accepted.
    Inactive,
    /// Started; events before `current_time` are rejected.
    Active,
}

// ── Shared admission rules ────────────────────────────────────────────

/// Validate `event` against the clock and insert it.
pub(crate) fn admit<R, C>(
    queue: &mut EventQueue<R, C>,
    event: Event<R, C>,
    now: VirtualTime,
    state: SchedulerState,
) -> SchedulerResult<EventId> {
    let time = event.time();
    if !time.is_valid() {
        debug!(time = time.value(), "rejected event with invalid time");
        return Err(SchedulerError::InvalidTime { time: time.value() });
    }
    if state == SchedulerState::Active && time < now {
        debug!(requested = %time, current = %now, "rejected non-causal event");
        return Err(SchedulerError::NonCausalEvent {
            requested: time,
            current: now,
        });
    }
    let id = queue.push(event);
    trace!(%id, %time, "event scheduled");
    Ok(id)
}

/// Schedule the first firing of a self-rescheduling timer.
pub(crate) fn arm_periodic<R, C, F>(
    queue: &mut EventQueue<R, C>,
    now: VirtualTime,
    state: SchedulerState,
    delay: VirtualTime,
    interval: VirtualTime,
    mut action: F,
) -> SchedulerResult<EventId>
where
    R: 'static,
    C: 'static,
    F: FnMut(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError> + 'static,
{
    if !interval.value().is_finite() || interval <= VirtualTime::ZERO {
        return Err(SchedulerError::InvalidInterval { interval });
    }
    // The next firing must land strictly later, or the timer would re-arm
    // at the same timestamp forever. Large clocks can absorb the interval.
    let first = now.plus(delay);
    if first.is_valid() && first.plus(interval) <= first {
        debug!(at = %first, %interval, "periodic interval does not advance the clock");
        return Err(SchedulerError::InvalidInterval { interval });
    }
    let event = Event::new(first).with_action(move |ctx| {
        let value = action(&mut *ctx)?;
        ctx.periodic(interval, interval, action)?;
        Ok(value)
    });
    admit(queue, event, now, state)
}

fn log_executed<R, C>(event: &Event<R, C>) {
    info!(
        id = event.id().map(EventId::raw),
        time = %event.time(),
        action = event.has_action(),
        "event executed"
    );
}

// ── EventScheduler ────────────────────────────────────────────────────

/// Top-level discrete-event scheduler.
///
/// Owns the pending queue and tracks the current virtual time. Each
/// instance is independent; any number can coexist in one process.
///
/// ```
/// use desim::{Event, EventScheduler};
///
/// let mut sched: EventScheduler<i32> = EventScheduler::new();
/// let id = sched.schedule(Event::new(10).with_action(|_| Ok(2018))).unwrap();
///
/// let fired = sched.step().unwrap();
/// assert_eq!(fired.id(), Some(id));
/// assert_eq!(fired.result(), Some(&2018));
/// assert_eq!(sched.current_time().value(), 10.0);
/// ```
pub struct EventScheduler<R = (), C = ()> {
    queue: EventQueue<R, C>,
    current_time: VirtualTime,
    state: SchedulerState,
    events_processed: u64,
    trace: Option<ExecutionTrace>,
    log_events: bool,
}

impl<R: 'static, C: 'static> EventScheduler<R, C> {
    /// Create an inactive scheduler at time zero.
    pub fn new() -> Self {
        Self::from_valid_config(SchedulerConfig::default())
    }

    /// Create an inactive scheduler whose clock starts at `epoch`.
    pub fn starting_at(epoch: impl Into<VirtualTime>) -> SchedulerResult<Self> {
        Self::with_config(SchedulerConfig {
            epoch: epoch.into(),
            ..SchedulerConfig::default()
        })
    }

    /// Create a scheduler from a validated config.
    pub fn with_config(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SchedulerConfig) -> Self {
        EventScheduler {
            queue: EventQueue::new(),
            current_time: config.epoch,
            state: SchedulerState::Inactive,
            events_processed: 0,
            trace: config.trace.then(ExecutionTrace::new),
            log_events: config.log_events,
        }
    }

    // ── Inspection ────────────────────────────────────────────

    /// Current virtual time.
    pub fn current_time(&self) -> VirtualTime {
        self.current_time
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SchedulerState::Active
    }

    /// Total events executed so far.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Number of pending events.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Time of the next pending event.
    pub fn peek_time(&self) -> Option<VirtualTime> {
        self.queue.peek_time()
    }

    /// The id the next scheduled event will receive.
    pub fn next_event_id(&self) -> EventId {
        self.queue.next_event_id()
    }

    /// Returns `true` if there are no more events to execute.
    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    /// The execution trace, when tracing is enabled.
    pub fn trace(&self) -> Option<&ExecutionTrace> {
        self.trace.as_ref()
    }

    /// Start recording executed events from now on.
    pub fn enable_trace(&mut self) {
        if self.trace.is_none() {
            self.trace = Some(ExecutionTrace::new());
        }
    }

    /// Stop tracing and hand back what was recorded.
    pub fn take_trace(&mut self) -> Option<ExecutionTrace> {
        self.trace.take()
    }

    // ── Scheduling ────────────────────────────────────────────

    /// Start enforcing causality. Idempotent.
    pub fn activate(&mut self) {
        if self.state == SchedulerState::Inactive {
            debug!(time = %self.current_time, "scheduler activated");
            self.state = SchedulerState::Active;
        }
    }

    /// Add an event to the pending queue.
    ///
    /// Fails with [`SchedulerError::InvalidTime`] for a `NaN` time and,
    /// once active, with [`SchedulerError::NonCausalEvent`] for a time
    /// before `current_time`. Nothing is queued on failure.
    pub fn schedule(&mut self, event: Event<R, C>) -> SchedulerResult<EventId> {
        admit(&mut self.queue, event, self.current_time, self.state)
    }

    /// Schedule a value whose type is only known at runtime.
    ///
    /// Anything other than an `Event<R, C>` fails with
    /// [`SchedulerError::NotAnEvent`] and leaves the queue untouched.
    pub fn schedule_dyn(&mut self, value: Box<dyn Any>) -> SchedulerResult<EventId> {
        match value.downcast::<Event<R, C>>() {
            Ok(event) => self.schedule(*event),
            Err(_) => {
                debug!("rejected non-event value");
                Err(SchedulerError::NotAnEvent)
            }
        }
    }

    /// Schedule `action` to run `delay` after the current time.
    pub fn timeout<F>(&mut self, delay: impl Into<VirtualTime>, action: F) -> SchedulerResult<EventId>
    where
        F: FnOnce(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError> + 'static,
    {
        let at = self.current_time.plus(delay);
        self.schedule(Event::new(at).with_action(action))
    }

    /// Like [`EventScheduler::timeout`], with a context payload attached.
    pub fn timeout_with_context<F>(
        &mut self,
        delay: impl Into<VirtualTime>,
        action: F,
        context: C,
    ) -> SchedulerResult<EventId>
    where
        F: FnOnce(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError> + 'static,
    {
        let at = self.current_time.plus(delay);
        self.schedule(Event::new(at).with_action(action).with_context(context))
    }

    /// Schedule a no-op event `delay` after the current time.
    pub fn timeout_empty(&mut self, delay: impl Into<VirtualTime>) -> SchedulerResult<EventId> {
        let at = self.current_time.plus(delay);
        self.schedule(Event::new(at))
    }

    /// Run `action` at `current_time + delay` and then every `interval`.
    ///
    /// Returns the id of the first firing. If the action fails, the timer
    /// stops and the error propagates out of the run.
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
            &mut self.queue,
            self.current_time,
            self.state,
            delay.into(),
            interval.into(),
            action,
        )
    }

    // ── Execution ─────────────────────────────────────────────

    /// Execute a single event: pop it, advance time, run its action.
    ///
    /// Activates the scheduler. Returns the executed event with its
    /// `result` filled in, or [`SchedulerError::SchedulerEmpty`] when
    /// nothing is pending. An action error is returned as
    /// [`SchedulerError::Action`]; the event is consumed and the clock
    /// stays at its time.
    pub fn step(&mut self) -> SchedulerResult<Event<R, C>> {
        self.activate();
        let mut event = self.queue.pop_next().ok_or(SchedulerError::SchedulerEmpty)?;

        self.current_time = event.time();
        self.events_processed += 1;

        let had_action = match event.take_action() {
            Some(action) => {
                let mut ctx = SchedulerContext {
                    queue: &mut self.queue,
                    now: self.current_time,
                };
                let value = action(&mut ctx).map_err(SchedulerError::Action)?;
                event.set_result(value);
                true
            }
            None => false,
        };

        if let (Some(trace), Some(id)) = (self.trace.as_mut(), event.id()) {
            trace.record(id, self.current_time, had_action);
        }
        trace!(id = ?event.id(), time = %self.current_time, "event stepped");
        Ok(event)
    }

    /// Execute every event due at or before `max_time`.
    ///
    /// The bound is inclusive. Events scheduled by actions during the run
    /// are executed too if they fall inside the bound. Returns the
    /// executed events in execution order; `logging` only controls
    /// whether each one is logged.
    pub fn run_until_max_time(
        &mut self,
        max_time: impl Into<VirtualTime>,
        logging: bool,
    ) -> SchedulerResult<Vec<Event<R, C>>> {
        let max_time = max_time.into();
        if !max_time.is_valid() {
            return Err(SchedulerError::InvalidTime {
                time: max_time.value(),
            });
        }
        self.activate();

        let mut executed = Vec::new();
        while self.queue.peek_time().is_some_and(|t| t <= max_time) {
            let event = self.step()?;
            if logging {
                log_executed(&event);
            }
            executed.push(event);
        }
        debug!(
            %max_time,
            executed = executed.len(),
            pending = self.queue.len(),
            "run finished"
        );
        Ok(executed)
    }

    /// Run until the queue is empty.
    ///
    /// Returns the number of events executed. Never returns while a
    /// periodic timer is armed.
    pub fn run(&mut self) -> SchedulerResult<u64> {
        self.run_for(u64::MAX)
    }

    /// Run until the queue is empty **or** `max_steps` events have been
    /// executed, whichever comes first.
    pub fn run_for(&mut self, max_steps: u64) -> SchedulerResult<u64> {
        self.activate();
        let mut steps = 0u64;
        while steps < max_steps && !self.queue.is_empty() {
            let event = self.step()?;
            if self.log_events {
                log_executed(&event);
            }
            steps += 1;
        }
        Ok(steps)
    }
}

impl<R: 'static, C: 'static> Default for EventScheduler<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> fmt::Debug for EventScheduler<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventScheduler")
            .field("current_time", &self.current_time)
            .field("state", &self.state)
            .field("pending", &self.queue.len())
            .field("events_processed", &self.events_processed)
            .field("tracing", &self.trace.is_some())
            .finish()
    }
}
