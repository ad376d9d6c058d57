//! # desim — Deterministic Discrete-Event Scheduler
//!
//! A simulation kernel for time-ordered callbacks. No async, no threads,
//! no wall-clock time: events are ordered by `(time, insertion order)`
//! and executed one at a time by a single driving loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────┐
//! │       EventScheduler         │ ← clock, activation, run control
//! │  ┌───────────────────────┐  │
//! │  │   SchedulerContext     │  │ ← handle given to running actions
//! │  └───────────────────────┘  │
//! │  ┌───────────────────────┐  │
//! │  │      EventQueue        │  │ ← (time, id) min-heap
//! │  └───────────────────────┘  │
//! │  ┌───────────────────────┐  │
//! │  │        Event           │  │ ← time, action, context, result
//! │  └───────────────────────┘  │
//! │  ┌───────────────────────┐  │
//! │  │     VirtualTime        │  │ ← logical clock
//! │  └───────────────────────┘  │
//! └─────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use desim::EventScheduler;
//!
//! let mut sched: EventScheduler<&'static str> = EventScheduler::new();
//! sched.periodic(0, 0.5, |_| Ok("fast")).unwrap();
//! sched.periodic(0, 1.0, |_| Ok("slow")).unwrap();
//!
//! let fired = sched.run_until_max_time(1, false).unwrap();
//! let names: Vec<_> = fired.iter().filter_map(|e| e.result().copied()).collect();
//! assert_eq!(names, ["fast", "slow", "fast", "slow", "fast"]);
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod queue;
pub mod scheduler;
pub mod time;
pub mod trace;

// Re-exports for convenience.
pub use config::{SchedulerBuilder, SchedulerConfig};
pub use error::{ActionError, ErrorKind, SchedulerError, SchedulerResult};
pub use event::{Action, Event, EventId, EventIdGen};
pub use queue::EventQueue;
pub use scheduler::{EventScheduler, SchedulerContext, SchedulerState};
pub use time::VirtualTime;
pub use trace::{traces_match, ExecutionTrace, TraceRecord};
