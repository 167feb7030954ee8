//! Insertion policies for pending events
//!
//! Both queues pop the event with the smallest scheduled time and break
//! ties by insertion sequence (first scheduled, first popped).
//!
//! - `HeapQueue`: binary min-heap, O(log n) insert and pop
//! - `SortedQueue`: vector kept sorted by re-sorting after every insert,
//!   O(n log n) per insert; kept as the reference policy

use crate::events::types::Event;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Ordered container of pending events
pub trait EventQueue: Default {
    /// Insert an event; `sequence` is strictly increasing per scheduler
    fn insert(&mut self, event: Event, sequence: u64);

    /// Remove and return the earliest event
    fn pop(&mut self) -> Option<Event>;

    /// Earliest event without removing it
    fn peek(&self) -> Option<&Event>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// (time, sequence) ordering shared by both queues
fn compare_keys(a_time: f64, a_seq: u64, b_time: f64, b_seq: u64) -> Ordering {
    a_time.total_cmp(&b_time).then(a_seq.cmp(&b_seq))
}

#[derive(Debug)]
struct HeapEntry {
    sequence: u64,
    event: Event,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // Reversed so the max-heap yields the earliest entry
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(
            other.event.scheduled_for(),
            other.sequence,
            self.event.scheduled_for(),
            self.sequence,
        )
    }
}

/// Binary min-heap keyed by (scheduled time, insertion sequence)
#[derive(Debug, Default)]
pub struct HeapQueue {
    heap: BinaryHeap<HeapEntry>,
}

impl EventQueue for HeapQueue {
    fn insert(&mut self, event: Event, sequence: u64) {
        self.heap.push(HeapEntry { sequence, event });
    }

    fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|entry| entry.event)
    }

    fn peek(&self) -> Option<&Event> {
        self.heap.peek().map(|entry| &entry.event)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Vector re-sorted after every insertion
///
/// Stored latest-first so popping the earliest event is a `Vec::pop`.
#[derive(Debug, Default)]
pub struct SortedQueue {
    entries: Vec<(u64, Event)>,
}

impl EventQueue for SortedQueue {
    fn insert(&mut self, event: Event, sequence: u64) {
        self.entries.push((sequence, event));
        self.entries.sort_by(|(a_seq, a), (b_seq, b)| {
            compare_keys(b.scheduled_for(), *b_seq, a.scheduled_for(), *a_seq)
        });
    }

    fn pop(&mut self) -> Option<Event> {
        self.entries.pop().map(|(_, event)| event)
    }

    fn peek(&self) -> Option<&Event> {
        self.entries.last().map(|(_, event)| event)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::{EventId, EventKind, ScriptAction};

    fn event(id: u64, time: f64) -> Event {
        Event::new(
            EventId(id),
            time,
            EventKind::Script(ScriptAction::Custom {
                name: format!("e{}", id),
            }),
        )
    }

    fn drain<Q: EventQueue>(mut queue: Q) -> Vec<u64> {
        let mut order = Vec::new();
        while let Some(e) = queue.pop() {
            order.push(e.id().0);
        }
        order
    }

    fn fill<Q: EventQueue>() -> Q {
        let mut queue = Q::default();
        let times = [3.0, 1.0, 2.0, 1.0, 3.0, 0.5];
        for (seq, time) in times.iter().enumerate() {
            queue.insert(event(seq as u64, *time), seq as u64);
        }
        queue
    }

    #[test]
    fn test_heap_orders_by_time_then_sequence() {
        assert_eq!(drain(fill::<HeapQueue>()), vec![5, 1, 3, 2, 0, 4]);
    }

    #[test]
    fn test_sorted_matches_heap() {
        assert_eq!(drain(fill::<SortedQueue>()), drain(fill::<HeapQueue>()));
    }

    #[test]
    fn test_peek_does_not_remove() {
        let queue = fill::<HeapQueue>();
        assert_eq!(queue.peek().map(|e| e.id().0), Some(5));
        assert_eq!(queue.len(), 6);
    }
}
