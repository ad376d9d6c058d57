/// Scheduler configuration and fluent builder.
///
/// `SchedulerConfig` is the plain, serializable part (epoch, tracing,
/// event logging). `SchedulerBuilder` layers pre-seeded events on top so a
/// whole initial model can be described in one expression.

use crate::error::{ActionError, SchedulerError, SchedulerResult};
use crate::event::{Action, Event};
use crate::scheduler::{EventScheduler, SchedulerContext};
use crate::time::VirtualTime;

// ── SchedulerConfig ───────────────────────────────────────────────────

/// Static settings for a new [`EventScheduler`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct SchedulerConfig {
    /// Initial value of `current_time`.
    pub epoch: VirtualTime,
    /// Keep an [`ExecutionTrace`](crate::trace::ExecutionTrace) of executed events.
    pub trace: bool,
    /// Log every executed event at `info` level in `run` and `run_for`.
    pub log_events: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            epoch: VirtualTime::ZERO,
            trace: false,
            log_events: false,
        }
    }
}

impl SchedulerConfig {
    /// Reject settings the scheduler cannot start from.
    pub fn validate(&self) -> SchedulerResult<()> {
        if !self.epoch.is_valid() || !self.epoch.value().is_finite() {
            return Err(SchedulerError::InvalidConfig(format!(
                "epoch must be a finite number, got {}",
                self.epoch.value()
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    ///
    /// Missing fields take their default values.
    #[cfg(feature = "serialize")]
    pub fn from_json(json: &str) -> SchedulerResult<Self> {
        let config: SchedulerConfig = serde_json::from_str(json)
            .map_err(|e| SchedulerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

// ── SchedulerBuilder ──────────────────────────────────────────────────

/// Fluent builder for an [`EventScheduler`] with initial events.
///
/// Seeded events are scheduled while the scheduler is still inactive, so
/// times before the epoch are accepted.
///
/// # Example
/// ```rust
/// use desim::{Event, SchedulerBuilder};
///
/// let mut sched = SchedulerBuilder::<u32>::new()
///     .starting_at(5)
///     .with_trace()
///     .event(Event::new(-1).with_action(|_| Ok(1)))
///     .timeout(2, |_| Ok(2))
///     .build()
///     .unwrap();
///
/// let done = sched.run_until_max_time(10, false).unwrap();
/// assert_eq!(done.len(), 2);
/// assert_eq!(done[1].time().value(), 7.0);
/// ```
pub struct SchedulerBuilder<R = (), C = ()> {
    config: SchedulerConfig,
    events: Vec<Seed<R, C>>,
}

enum Seed<R, C> {
    At(Event<R, C>),
    After(VirtualTime, Action<R, C>),
}

impl<R: 'static, C: 'static> SchedulerBuilder<R, C> {
    /// Create a builder with the default config.
    pub fn new() -> Self {
        SchedulerBuilder {
            config: SchedulerConfig::default(),
            events: Vec::new(),
        }
    }

    /// Start from an existing config.
    pub fn from_config(config: SchedulerConfig) -> Self {
        SchedulerBuilder {
            config,
            events: Vec::new(),
        }
    }

    /// Set the initial `current_time`.
    pub fn starting_at(mut self, epoch: impl Into<VirtualTime>) -> Self {
        self.config.epoch = epoch.into();
        self
    }

    /// Record an execution trace.
    pub fn with_trace(mut self) -> Self {
        self.config.trace = true;
        self
    }

    /// Log executed events in `run` and `run_for`.
    pub fn log_events(mut self, enabled: bool) -> Self {
        self.config.log_events = enabled;
        self
    }

    // ── Events ────────────────────────────────────────────────

    /// Seed an event at its absolute time.
    pub fn event(mut self, event: Event<R, C>) -> Self {
        self.events.push(Seed::At(event));
        self
    }

    /// Seed an action `delay` after the epoch.
    pub fn timeout<F>(mut self, delay: impl Into<VirtualTime>, action: F) -> Self
    where
        F: FnOnce(&mut SchedulerContext<'_, R, C>) -> Result<R, ActionError> + 'static,
    {
        self.events.push(Seed::After(delay.into(), Box::new(action)));
        self
    }

    // ── Build ─────────────────────────────────────────────────

    /// Validate the config and schedule every seeded event in order.
    pub fn build(self) -> SchedulerResult<EventScheduler<R, C>> {
        let mut sched = EventScheduler::with_config(self.config)?;
        for seed in self.events {
            match seed {
                Seed::At(event) => {
                    sched.schedule(event)?;
                }
                Seed::After(delay, action) => {
                    sched.timeout(delay, action)?;
                }
            }
        }
        Ok(sched)
    }
}

impl<R: 'static, C: 'static> Default for SchedulerBuilder<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.epoch, VirtualTime::ZERO);
        assert!(!config.trace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_epoch() {
        for bad in [f64::NAN, f64::INFINITY] {
            let config = SchedulerConfig {
                epoch: VirtualTime::new(bad),
                ..SchedulerConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Config);
        }
    }

    #[test]
    fn test_builder_epoch_and_seeds() {
        let sched = SchedulerBuilder::<(), ()>::new()
            .starting_at(100)
            .event(Event::new(3))
            .timeout(1, |_| Ok(()))
            .build()
            .unwrap();

        assert_eq!(sched.current_time(), VirtualTime::from(100));
        assert_eq!(sched.pending_count(), 2);
        // Pre-activation seeding in the past of the epoch is allowed.
        assert_eq!(sched.peek_time(), Some(VirtualTime::from(3)));
        assert!(!sched.is_active());
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        let result = SchedulerBuilder::<(), ()>::new().starting_at(f64::NAN).build();
        assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_trace_enabled() {
        let mut sched = SchedulerBuilder::<(), ()>::new()
            .with_trace()
            .event(Event::new(1))
            .build()
            .unwrap();
        sched.run().unwrap();
        assert_eq!(sched.trace().map(|t| t.len()), Some(1));
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_config_from_json() {
        let config = SchedulerConfig::from_json(r#"{"epoch": 2.5, "trace": true}"#).unwrap();
        assert_eq!(config.epoch, VirtualTime::from(2.5));
        assert!(config.trace);
        assert!(!config.log_events);

        let err = SchedulerConfig::from_json(r#"{"epoch": "soon"}"#).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }
}
