//! Discrete-event scheduler
//!
//! Orders pending events by scheduled time and refuses to schedule any event
//! twice. The scheduler belongs to one run (it lives in the run's
//! `SimulationContext`); nothing here is global.
//!
//! # Critical Invariants
//!
//! 1. **Ordering**: `pop` always returns the earliest pending event; equal
//!    times pop in insertion order
//! 2. **No double-scheduling**: every id ever accepted is remembered, also
//!    after the event has been popped
//! 3. **No past events**: nothing is scheduled before the reference time,
//!    which only moves forward

use crate::events::queue::{EventQueue, HeapQueue};
use crate::events::types::{Event, EventId, EventKind};
use std::collections::HashSet;
use thiserror::Error;
use tracing::trace;

/// Scheduling invariant violations
///
/// These indicate a logic bug in the caller and abort the run.
#[derive(Debug, Error, PartialEq)]
pub enum SchedulerError {
    #[error("Event {id} was already scheduled")]
    DuplicateScheduling { id: EventId },

    #[error("Event scheduled for {scheduled_for} lies before reference time {reference_time}")]
    PastScheduling {
        scheduled_for: f64,
        reference_time: f64,
    },

    #[error("No pending events")]
    EmptyQueue,

    #[error("Event time {scheduled_for} is not a finite number")]
    InvalidTime { scheduled_for: f64 },
}

/// Event scheduler over an insertion policy `Q`
///
/// # Example
/// ```
/// use adoption_simulator_core_rs::events::{DiscreteEventScheduler, EventKind, ScriptAction};
///
/// let mut scheduler = DiscreteEventScheduler::new(0.0);
/// let kind = EventKind::Script(ScriptAction::Custom { name: "x".to_string() });
/// scheduler.schedule(2.0, kind.clone()).unwrap();
/// scheduler.schedule(1.0, kind).unwrap();
///
/// assert_eq!(scheduler.pop().unwrap().scheduled_for(), 1.0);
/// assert_eq!(scheduler.pop().unwrap().scheduled_for(), 2.0);
/// assert!(!scheduler.exists_next());
/// ```
#[derive(Debug)]
pub struct EventScheduler<Q: EventQueue = HeapQueue> {
    queue: Q,
    ever_scheduled: HashSet<EventId>,
    reference_time: f64,
    next_event_id: u64,
    next_sequence: u64,
}

/// Scheduler keeping pending events in a binary min-heap
pub type DiscreteEventScheduler = EventScheduler<HeapQueue>;

impl<Q: EventQueue> EventScheduler<Q> {
    pub fn new(reference_time: f64) -> Self {
        Self {
            queue: Q::default(),
            ever_scheduled: HashSet::new(),
            reference_time,
            next_event_id: 0,
            next_sequence: 0,
        }
    }

    /// Earliest time an event may be created or scheduled for
    pub fn reference_time(&self) -> f64 {
        self.reference_time
    }

    /// Move the reference time forward; earlier times are ignored
    pub fn advance_reference_time(&mut self, time: f64) {
        if time > self.reference_time {
            self.reference_time = time;
        }
    }

    /// Create an event with a fresh id
    ///
    /// Fails if `scheduled_for` is not finite or lies before the reference
    /// time. The event is not scheduled yet.
    pub fn create_event(&mut self, scheduled_for: f64, kind: EventKind) -> Result<Event, SchedulerError> {
        self.check_time(scheduled_for)?;
        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        Ok(Event::new(id, scheduled_for, kind))
    }

    /// Accept an event into the pending queue
    pub fn schedule_event(&mut self, event: Event) -> Result<EventId, SchedulerError> {
        let id = event.id();
        if self.ever_scheduled.contains(&id) {
            return Err(SchedulerError::DuplicateScheduling { id });
        }
        self.check_time(event.scheduled_for())?;

        trace!(
            event_id = %id,
            kind = event.kind().name(),
            scheduled_for = event.scheduled_for(),
            "scheduled event"
        );

        self.ever_scheduled.insert(id);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.insert(event, sequence);
        Ok(id)
    }

    /// Create and schedule in one step
    pub fn schedule(&mut self, scheduled_for: f64, kind: EventKind) -> Result<EventId, SchedulerError> {
        let event = self.create_event(scheduled_for, kind)?;
        self.schedule_event(event)
    }

    /// Remove and return the earliest pending event
    pub fn pop(&mut self) -> Result<Event, SchedulerError> {
        self.queue.pop().ok_or(SchedulerError::EmptyQueue)
    }

    /// Earliest pending event, without removing it
    pub fn top(&self) -> Result<&Event, SchedulerError> {
        self.queue.peek().ok_or(SchedulerError::EmptyQueue)
    }

    pub fn exists_next(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Whether this event's id was ever accepted by `schedule_event`
    pub fn ever_scheduled(&self, event: &Event) -> bool {
        self.ever_scheduled.contains(&event.id())
    }

    /// Pop the earliest event if it is due at `time`
    ///
    /// Leaves the queue untouched when it is empty or its head lies after
    /// `time`.
    pub fn pop_due(&mut self, time: f64) -> Option<Event> {
        match self.queue.peek() {
            Some(head) if head.scheduled_for() <= time => self.queue.pop(),
            _ => None,
        }
    }

    /// Number of events waiting
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of events ever accepted
    pub fn total_scheduled(&self) -> usize {
        self.ever_scheduled.len()
    }

    fn check_time(&self, scheduled_for: f64) -> Result<(), SchedulerError> {
        if !scheduled_for.is_finite() {
            return Err(SchedulerError::InvalidTime { scheduled_for });
        }
        if scheduled_for < self.reference_time {
            return Err(SchedulerError::PastScheduling {
                scheduled_for,
                reference_time: self.reference_time,
            });
        }
        Ok(())
    }
}

impl<Q: EventQueue> Default for EventScheduler<Q> {
    fn default() -> Self {
        Self::new(0.0)
    }
}
