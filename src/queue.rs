/// Pending-event queue.
///
/// Uses a `BinaryHeap` with reversed `Ord` on its entries to act as a
/// min-heap keyed by `(time, event_id)`. Because event IDs are strictly
/// increasing, events due at the same time leave the queue in the order
/// they entered it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::event::{Event, EventId, EventIdGen};
use crate::time::VirtualTime;

/// Heap entry. The key is copied out of the event so ordering never
/// depends on anything the event could change.
struct Pending<R, C> {
    time: VirtualTime,
    id: EventId,
    event: Event<R, C>,
}

impl<R, C> PartialEq for Pending<R, C> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl<R, C> Eq for Pending<R, C> {}

/// Ordering: smallest `(time, id)` first.
///
/// Rust's `BinaryHeap` is a *max*-heap, so the natural ordering is
/// reversed here to turn it into a min-heap.
impl<R, C> Ord for Pending<R, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl<R, C> PartialOrd for Pending<R, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Owns the pending events and the ID generator. All insertions go
/// through [`EventQueue::push`] so IDs stay monotonic.
pub struct EventQueue<R, C> {
    heap: BinaryHeap<Pending<R, C>>,
    id_gen: EventIdGen,
}

impl<R, C> EventQueue<R, C> {
    /// Create a new, empty queue.
    pub fn new() -> Self {
        EventQueue {
            heap: BinaryHeap::new(),
            id_gen: EventIdGen::new(),
        }
    }

    /// Insert an event, assigning it the next id.
    ///
    /// No validation happens here; the scheduler checks times first.
    pub fn push(&mut self, mut event: Event<R, C>) -> EventId {
        let id = self.id_gen.next_id();
        event.assign_id(id);
        self.heap.push(Pending {
            time: event.time(),
            id,
            event,
        });
        id
    }

    /// Pop the next event (earliest time, lowest ID).
    pub fn pop_next(&mut self) -> Option<Event<R, C>> {
        self.heap.pop().map(|p| p.event)
    }

    /// Time of the next event, if any.
    pub fn peek_time(&self) -> Option<VirtualTime> {
        self.heap.peek().map(|p| p.time)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// The id the next pushed event will receive.
    pub fn next_event_id(&self) -> EventId {
        self.id_gen.peek()
    }
}

impl<R, C> Default for EventQueue<R, C> {
    fn default() -> Self {
        Self::new()
    }
}
