//! Adoption Simulator Core - Rust Engine
//!
//! Discrete-event, agent-based simulation of technology adoption with
//! deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Time management
//! - **models**: Domain types (agents, products, graph, messages, history)
//! - **events**: Events, scheduler and event handlers
//! - **decision**: Decision processes and utility functions
//! - **schemes**: Communication and need-development collaborators
//! - **orchestrator**: Per-run context, process model and tick loop
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Events pop in non-decreasing time order and are never scheduled twice
//! 2. All randomness is deterministic (seeded RNG owned by the run)
//! 3. Every iteration the outcome depends on runs in id order

// Module declarations
pub mod core;
pub mod decision;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod schemes;

// Re-exports for convenience
pub use core::time::TimeManager;
pub use decision::{
    ConfigError, DecisionConfiguration, DecisionContext, DecisionError, DecisionProcess, UtilityRegistry,
};
pub use events::{DiscreteEventScheduler, Event, EventId, EventKind, NeedOutcome, SchedulerError};
pub use models::{
    agent::{AdoptedProduct, AgentError, ConsumerAgent},
    history::{History, HistoryEvent, Phase},
    product::{Market, Product, ProductGroup},
    state::SimulationState,
};
pub use orchestrator::{
    compute_state_digest, Orchestrator, SimulationConfig, SimulationContext, SimulationError, TickResult,
};
pub use rng::RngManager;
