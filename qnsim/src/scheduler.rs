use crate::{CustomerId, StationId};

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

/// Customer `customer` arrives at `target` at `time`, having just left `origin`.
/// Events without origin are either fresh arrivals at the entrance or requests to admit
/// a waiting customer into a service slot that has just been freed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Station the customer arrives at.
    pub target: StationId,
    /// Station the customer departs from.
    pub origin: Option<StationId>,
    /// Simulation time of the event.
    pub time: f64,
    /// The arriving customer.
    pub customer: CustomerId,
}

impl Event {
    /// Constructs a new event.
    #[must_use]
    pub fn new(
        target: StationId,
        origin: Option<StationId>,
        time: f64,
        customer: CustomerId,
    ) -> Self {
        Self {
            target,
            origin,
            time,
            customer,
        }
    }
}

/// Entry stored in the heap. Ordered by time and then by insertion sequence.
#[derive(Debug)]
struct EventEntry {
    time: OrderedFloat<f64>,
    sequence: u64,
    event: Event,
}

impl EventEntry {
    fn key(&self) -> (OrderedFloat<f64>, u64) {
        (self.time, self.sequence)
    }
}

impl PartialEq for EventEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EventEntry {}

impl PartialOrd for EventEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Event scheduler. Stores future events in a priority queue, earliest first.
/// Events with equal times come out in the order they were scheduled.
#[derive(Debug, Default)]
pub struct Scheduler {
    scheduled_events: BinaryHeap<Reverse<EventEntry>>,
    sequence: u64,
}

impl Scheduler {
    /// Schedules `event` at its time.
    pub fn schedule(&mut self, event: Event) {
        let sequence = self.sequence;
        self.sequence += 1;
        self.scheduled_events.push(Reverse(EventEntry {
            time: OrderedFloat(event.time),
            sequence,
            event,
        }));
    }

    /// Removes and returns the earliest event, or `None` if none are left.
    pub fn pop(&mut self) -> Option<Event> {
        self.scheduled_events.pop().map(|Reverse(entry)| entry.event)
    }

    /// Returns the earliest event without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Event> {
        self.scheduled_events
            .peek()
            .map(|Reverse(entry)| &entry.event)
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scheduled_events.len()
    }

    /// Answers whether there are no pending events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scheduled_events.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(time: f64, customer: u64) -> Event {
        Event::new(StationId::from(0), None, time, CustomerId::from(customer))
    }

    #[test]
    fn test_scheduler() {
        let mut scheduler = Scheduler::default();
        assert!(scheduler.is_empty());
        assert!(scheduler.pop().is_none());

        scheduler.schedule(event(1.0, 1));
        scheduler.schedule(event(0.0, 2));
        scheduler.schedule(event(2.0, 3));
        assert_eq!(scheduler.len(), 3);

        assert_eq!(scheduler.peek(), Some(&event(0.0, 2)));
        assert_eq!(scheduler.len(), 3);

        assert_eq!(scheduler.pop(), Some(event(0.0, 2)));
        assert_eq!(scheduler.pop(), Some(event(1.0, 1)));
        assert_eq!(scheduler.pop(), Some(event(2.0, 3)));
        assert!(scheduler.pop().is_none());
        assert!(scheduler.peek().is_none());
    }

    #[test]
    fn test_zero_time_event_is_not_empty() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(event(0.0, 1));
        assert_eq!(scheduler.pop().map(|e| e.time), Some(0.0));
    }

    #[test]
    fn test_ties_are_fifo() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(event(5.0, 10));
        for customer in 1..=5 {
            scheduler.schedule(event(1.5, customer));
        }
        let order: Vec<u64> = std::iter::from_fn(|| scheduler.pop())
            .map(|e| u64::from(e.customer))
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 10]);
    }
}
