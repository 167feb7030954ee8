//! Orchestrator - per-run context, process model and tick loop
//!
//! See `engine.rs` for the tick loop.

pub mod checkpoint;
pub mod config;
pub mod context;
pub mod engine;
pub mod process_model;

pub use checkpoint::{compute_state_digest, AgentSnapshot, StateSnapshot};
pub use config::{AgentConfig, ConsumerGroupConfig, EdgeConfig, SimulationConfig};
pub use context::SimulationContext;
pub use engine::{Orchestrator, SimulationError, TickResult};
pub use process_model::{ProcessModel, RogersFiveStepModel};
