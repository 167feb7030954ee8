//! Run history for replay checks and analysis.
//!
//! The history captures every state change the kernel makes, in the order it
//! makes them. Diagnostics go to `tracing`; the history is the record tests
//! and exporters read.

use serde::{Deserialize, Serialize};

/// Orchestrator phase an entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Knowledge,
    Persuasion,
    Decision,
    Implementation,
    Confirmation,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 5] = [
        Phase::Knowledge,
        Phase::Persuasion,
        Phase::Decision,
        Phase::Implementation,
        Phase::Confirmation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Knowledge => "knowledge",
            Phase::Persuasion => "persuasion",
            Phase::Decision => "decision",
            Phase::Implementation => "implementation",
            Phase::Confirmation => "confirmation",
        }
    }
}

/// A recorded state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEvent {
    /// Agent adopted a product
    Adopted {
        time: f64,
        agent: String,
        product: String,
        decision_process: String,
        expires_at: f64,
    },

    /// A held adoption passed its expiration date
    AdoptionExpired {
        time: f64,
        agent: String,
        product: String,
    },

    /// A need found no qualifying product and was handed back
    NeedDeferred {
        time: f64,
        agent: String,
        need: String,
    },

    /// A message reached its receiver and changed something
    MessageDelivered {
        time: f64,
        sender: String,
        receiver: String,
    },

    /// An adopter re-assessed a held product
    PostPurchaseEvaluated {
        time: f64,
        agent: String,
        product: String,
        better_available: bool,
    },

    /// A phase hook failed for one agent; the run continued
    PhaseFailed {
        time: f64,
        agent: String,
        phase: Phase,
        reason: String,
    },

    /// An event of an unsupported kind was skipped
    UnsupportedSkipped { time: f64, reason: String },

    /// Product put on the market
    ProductIntroduced { time: f64, product: String },

    /// Product taken off the market
    ProductDiscontinued {
        time: f64,
        product: String,
        wiped_adoptions: usize,
    },

    /// An event referenced state invalidated since scheduling
    StaleEventSkipped { time: f64, reason: String },
}

impl HistoryEvent {
    pub fn time(&self) -> f64 {
        match self {
            HistoryEvent::Adopted { time, .. }
            | HistoryEvent::AdoptionExpired { time, .. }
            | HistoryEvent::NeedDeferred { time, .. }
            | HistoryEvent::MessageDelivered { time, .. }
            | HistoryEvent::PostPurchaseEvaluated { time, .. }
            | HistoryEvent::PhaseFailed { time, .. }
            | HistoryEvent::UnsupportedSkipped { time, .. }
            | HistoryEvent::ProductIntroduced { time, .. }
            | HistoryEvent::ProductDiscontinued { time, .. }
            | HistoryEvent::StaleEventSkipped { time, .. } => *time,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            HistoryEvent::Adopted { .. } => "Adopted",
            HistoryEvent::AdoptionExpired { .. } => "AdoptionExpired",
            HistoryEvent::NeedDeferred { .. } => "NeedDeferred",
            HistoryEvent::MessageDelivered { .. } => "MessageDelivered",
            HistoryEvent::PostPurchaseEvaluated { .. } => "PostPurchaseEvaluated",
            HistoryEvent::PhaseFailed { .. } => "PhaseFailed",
            HistoryEvent::UnsupportedSkipped { .. } => "UnsupportedSkipped",
            HistoryEvent::ProductIntroduced { .. } => "ProductIntroduced",
            HistoryEvent::ProductDiscontinued { .. } => "ProductDiscontinued",
            HistoryEvent::StaleEventSkipped { .. } => "StaleEventSkipped",
        }
    }

    /// Agent the entry is about, if any
    pub fn agent(&self) -> Option<&str> {
        match self {
            HistoryEvent::Adopted { agent, .. }
            | HistoryEvent::AdoptionExpired { agent, .. }
            | HistoryEvent::NeedDeferred { agent, .. }
            | HistoryEvent::PostPurchaseEvaluated { agent, .. }
            | HistoryEvent::PhaseFailed { agent, .. } => Some(agent),
            HistoryEvent::MessageDelivered { receiver, .. } => Some(receiver),
            _ => None,
        }
    }
}

/// Ordered record of everything that happened in a run
#[derive(Debug, Clone, Default)]
pub struct History {
    events: Vec<HistoryEvent>,
}

impl History {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: HistoryEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[HistoryEvent] {
        &self.events
    }

    /// Entries of one type, e.g. `"Adopted"`
    pub fn events_of_type(&self, event_type: &str) -> Vec<&HistoryEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_agent(&self, agent: &str) -> Vec<&HistoryEvent> {
        self.events
            .iter()
            .filter(|e| e.agent() == Some(agent))
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
