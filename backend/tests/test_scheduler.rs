//! Tests for the event scheduler
//!
//! - pop order is non-decreasing in time, FIFO among equal times
//! - double scheduling and past scheduling are rejected
//! - both insertion policies pop in the same order

use adoption_simulator_core_rs::events::{
    DiscreteEventScheduler, EventKind, EventScheduler, ScriptAction, SchedulerError, SortedQueue,
};
use proptest::prelude::*;

fn noop(tag: usize) -> EventKind {
    EventKind::Script(ScriptAction::Custom {
        name: format!("e{}", tag),
    })
}

#[test]
fn test_pop_returns_minimum_time() {
    let mut scheduler = DiscreteEventScheduler::new(0.0);
    for (i, t) in [5.0, 1.0, 3.0, 2.0, 4.0].iter().enumerate() {
        scheduler.schedule(*t, noop(i)).unwrap();
    }

    let mut times = Vec::new();
    while scheduler.exists_next() {
        let head = scheduler.top().unwrap().id();
        let event = scheduler.pop().unwrap();
        assert_eq!(event.id(), head);
        times.push(event.scheduled_for());
    }
    assert_eq!(times, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_equal_times_pop_in_insertion_order() {
    let mut scheduler = DiscreteEventScheduler::new(0.0);
    let first = scheduler.schedule(1.0, noop(0)).unwrap();
    let second = scheduler.schedule(1.0, noop(1)).unwrap();
    let third = scheduler.schedule(1.0, noop(2)).unwrap();

    assert_eq!(scheduler.pop().unwrap().id(), first);
    assert_eq!(scheduler.pop().unwrap().id(), second);
    assert_eq!(scheduler.pop().unwrap().id(), third);
}

#[test]
fn test_duplicate_scheduling_rejected() {
    let mut scheduler = DiscreteEventScheduler::new(0.0);
    let event = scheduler.create_event(2.0, noop(0)).unwrap();
    let id = event.id();

    scheduler.schedule_event(event.clone()).unwrap();
    assert_eq!(
        scheduler.schedule_event(event),
        Err(SchedulerError::DuplicateScheduling { id })
    );
    assert_eq!(scheduler.pending(), 1);
}

#[test]
fn test_past_scheduling_rejected() {
    let mut scheduler = DiscreteEventScheduler::new(3.0);
    assert_eq!(
        scheduler.schedule(2.5, noop(0)),
        Err(SchedulerError::PastScheduling {
            scheduled_for: 2.5,
            reference_time: 3.0,
        })
    );
    assert!(!scheduler.exists_next());
    assert!(scheduler.schedule(3.0, noop(1)).is_ok());
}

#[test]
fn test_empty_scheduler() {
    let mut scheduler = DiscreteEventScheduler::new(0.0);
    assert!(!scheduler.exists_next());
    assert_eq!(scheduler.pop(), Err(SchedulerError::EmptyQueue));
}

#[test]
fn test_pop_due_with_nothing_due_is_a_no_op() {
    let mut scheduler = DiscreteEventScheduler::new(0.0);
    scheduler.schedule(5.0, noop(0)).unwrap();

    assert!(scheduler.pop_due(4.0).is_none());
    assert!(scheduler.pop_due(4.0).is_none());
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(scheduler.total_scheduled(), 1);
    assert_eq!(scheduler.top().unwrap().scheduled_for(), 5.0);
}

proptest! {
    #[test]
    fn prop_pop_order_non_decreasing(times in prop::collection::vec(0.0f64..1000.0, 0..200)) {
        let mut scheduler = DiscreteEventScheduler::new(0.0);
        for (i, t) in times.iter().enumerate() {
            scheduler.schedule(*t, noop(i)).unwrap();
        }

        let mut last = f64::NEG_INFINITY;
        let mut popped = 0;
        while let Ok(event) = scheduler.pop() {
            prop_assert!(event.scheduled_for() >= last);
            last = event.scheduled_for();
            popped += 1;
        }
        prop_assert_eq!(popped, times.len());
    }

    #[test]
    fn prop_heap_and_sorted_policies_agree(times in prop::collection::vec(0u8..10, 0..100)) {
        let mut heap = DiscreteEventScheduler::new(0.0);
        let mut sorted = EventScheduler::<SortedQueue>::new(0.0);
        for (i, t) in times.iter().enumerate() {
            heap.schedule(f64::from(*t), noop(i)).unwrap();
            sorted.schedule(f64::from(*t), noop(i)).unwrap();
        }

        while let Ok(a) = heap.pop() {
            let b = sorted.pop().unwrap();
            prop_assert_eq!(a.id(), b.id());
        }
        prop_assert!(!sorted.exists_next());
    }
}
