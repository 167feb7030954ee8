//! Scheduled event types
//!
//! An event is a unit of future work with a scheduled time. Events are
//! created through the scheduler (which allocates their identity and checks
//! that they are not dated in the past), scheduled once, popped once and
//! then discarded.
//!
//! # Design Principles
//!
//! 1. **Identity**: every event carries a run-unique `EventId`
//! 2. **Self-contained**: events include all data needed for execution
//! 3. **Revalidated**: handlers re-check referenced agents and products,
//!    since state may have changed after scheduling

use crate::models::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Run-unique event identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ev_{:08}", self.0)
    }
}

/// Scripted state change loaded from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptAction {
    /// Put a product on the market
    IntroduceProduct { product: String },

    /// Take a product off the market and wipe it from every agent
    DiscontinueProduct { product: String },

    /// Make one agent aware of a product
    SeedAwareness { agent: String, product: String },

    /// Give an agent a need and raise it immediately
    RaiseNeed { agent: String, need: String },

    /// Action kind this kernel does not implement
    Custom { name: String },
}

/// A script action paired with the time it fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub at: f64,
    pub action: ScriptAction,
}

/// What an event does when executed
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Deliver a message to its receiver
    Communication(Message),

    /// Let an agent act on a need
    Need { agent: String, need: String },

    /// Let an adopter re-assess a held product
    PostPurchaseEvaluation { agent: String, product: String },

    /// Apply a scripted state change
    Script(ScriptAction),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Communication(_) => "communication",
            EventKind::Need { .. } => "need",
            EventKind::PostPurchaseEvaluation { .. } => "post_purchase_evaluation",
            EventKind::Script(_) => "script",
        }
    }
}

/// A unit of future work
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: EventId,
    scheduled_for: f64,
    kind: EventKind,
}

impl Event {
    /// Only the scheduler creates events, so identities stay unique per run
    pub(crate) fn new(id: EventId, scheduled_for: f64, kind: EventKind) -> Self {
        Self {
            id,
            scheduled_for,
            kind,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn scheduled_for(&self) -> f64 {
        self.scheduled_for
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn into_kind(self) -> EventKind {
        self.kind
    }
}
