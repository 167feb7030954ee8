//! Discrete events
//!
//! - `types`: events and their payloads
//! - `queue`: insertion policies
//! - `scheduler`: ordered pending queue with double-scheduling protection
//! - `handler`: executes popped events against the run context
//! - `need`: need events, the bridge to decision processes

pub mod handler;
pub mod need;
pub mod queue;
pub mod scheduler;
pub mod types;

pub use need::NeedOutcome;
pub use queue::{EventQueue, HeapQueue, SortedQueue};
pub use scheduler::{DiscreteEventScheduler, EventScheduler, SchedulerError};
pub use types::{Event, EventId, EventKind, ScriptAction, ScriptedEvent};
