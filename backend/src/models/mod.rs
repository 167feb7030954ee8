//! Domain models for the adoption simulator

pub mod agent;
pub mod graph;
pub mod history;
pub mod message;
pub mod product;
pub mod state;

// Re-exports
pub use agent::{AdoptedProduct, AgentError, ConsumerAgent, ValuePreference};
pub use graph::{AdjacencyGraph, EdgeKind, SocialGraph};
pub use history::{History, HistoryEvent, Phase};
pub use message::{Message, MessageContent, MessageEffect};
pub use product::{LifetimeDistribution, Market, Product, ProductAttribute, ProductGroup, ValueMapping};
pub use state::SimulationState;
