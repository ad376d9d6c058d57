/// Virtual time for the discrete-event scheduler.
///
/// A logical timestamp with no dependency on `std::time`. Time advances
/// only when the scheduler executes events, never from wall-clock
/// observation. Both integer and fractional timestamps are accepted.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A point in simulated time.
///
/// Backed by an `f64` so that `0.5`-tick timers and `+inf` run bounds
/// work alongside whole-tick timestamps. Ordering is total
/// (`f64::total_cmp`); `-0.0` is folded into `0.0` on construction.
///
/// `NaN` can be constructed but is rejected by the scheduler, so it never
/// reaches the pending queue.
#[derive(Debug, Clone, Copy)]
pub struct VirtualTime(f64);

impl VirtualTime {
    /// The zero-point of simulation time.
    pub const ZERO: VirtualTime = VirtualTime(0.0);

    /// A bound no finite event time can exceed.
    pub const INFINITY: VirtualTime = VirtualTime(f64::INFINITY);

    /// Create a new `VirtualTime` from a raw value.
    #[inline]
    pub fn new(value: f64) -> Self {
        // Adding +0.0 turns -0.0 into +0.0 and leaves everything else alone.
        VirtualTime(value + 0.0)
    }

    /// Return the raw value.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Compute the absolute time that is `delay` after `self`.
    #[inline]
    pub fn plus(self, delay: impl Into<VirtualTime>) -> VirtualTime {
        VirtualTime::new(self.0 + delay.into().0)
    }

    /// Returns `true` if `self` is strictly before `other`.
    #[inline]
    pub fn is_before(self, other: VirtualTime) -> bool {
        self < other
    }

    /// Returns `false` for `NaN`, the only value the scheduler refuses.
    #[inline]
    pub fn is_valid(self) -> bool {
        !self.0.is_nan()
    }
}

impl PartialEq for VirtualTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VirtualTime {}

impl PartialOrd for VirtualTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VirtualTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for VirtualTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Default for VirtualTime {
    fn default() -> Self {
        VirtualTime::ZERO
    }
}

impl From<f64> for VirtualTime {
    fn from(value: f64) -> Self {
        VirtualTime::new(value)
    }
}

impl From<f32> for VirtualTime {
    fn from(value: f32) -> Self {
        VirtualTime::new(f64::from(value))
    }
}

impl From<i32> for VirtualTime {
    fn from(value: i32) -> Self {
        VirtualTime::new(f64::from(value))
    }
}

impl From<u32> for VirtualTime {
    fn from(value: u32) -> Self {
        VirtualTime::new(f64::from(value))
    }
}

impl From<i64> for VirtualTime {
    fn from(value: i64) -> Self {
        VirtualTime::new(value as f64)
    }
}

impl From<u64> for VirtualTime {
    fn from(value: u64) -> Self {
        VirtualTime::new(value as f64)
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T={}", self.0)
    }
}

// ── Serialization ───────────────────────────────────────────────────────
//
// JSON has no literal for infinity, so non-finite times travel as the
// strings `"inf"`, `"-inf"` and `"NaN"`. Finite times stay plain numbers.

#[cfg(feature = "serialize")]
impl serde::Serialize for VirtualTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str(&self.0.to_string())
        }
    }
}

#[cfg(feature = "serialize")]
impl<'de> serde::Deserialize<'de> for VirtualTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(VirtualTime::new(v)),
            Repr::Text(text) => text
                .parse::<f64>()
                .map(VirtualTime::new)
                .map_err(|_| serde::de::Error::custom(format!("invalid time: {text:?}"))),
        }
    }
}
