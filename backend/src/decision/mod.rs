//! Adoption decision processes
//!
//! A decision process picks one product among candidates and can tell
//! whether a better product than a held one is available. Strategies are
//! built once per run from configuration (see [`config`]) and shared by
//! every agent and tick that references them by name.
//!
//! Strategies never filter candidates themselves: the need-event glue hands
//! them a non-empty, id-sorted list of aware, on-market, admissible products.

pub mod config;
pub mod deliberative;
pub mod kiesling;
pub mod take_the_best;
pub mod utility;

use crate::models::agent::ConsumerAgent;
use crate::models::graph::SocialGraph;
use crate::models::product::{Market, Product, ProductGroup};
use crate::models::state::SimulationState;
use crate::rng::RngManager;
use std::fmt::Debug;
use thiserror::Error;

pub use config::{ConfigError, DecisionConfiguration, DecisionProcessSpec};
pub use deliberative::DeliberativeDecision;
pub use kiesling::KieslingDecision;
pub use take_the_best::{TakeTheBestDecision, TakeTheBestVariant};
pub use utility::{PerceivedValueUtility, UtilityFunction, UtilityRegistry, ValueMappingUtility};

/// Errors raised while choosing a product
///
/// All of these point at an upstream bug (bad filtering or configuration
/// that escaped validation) and abort the run.
#[derive(Debug, Error, PartialEq)]
pub enum DecisionError {
    #[error("No candidate products for agent {agent}")]
    NoCandidates { agent: String },

    #[error("Unknown product: {product}")]
    UnknownProduct { product: String },

    #[error("Unknown product group: {group}")]
    UnknownProductGroup { group: String },

    #[error("No importance attitude for consumer group {consumer_group} and product group {product_group}")]
    MissingImportanceAttitude {
        consumer_group: String,
        product_group: String,
    },

    #[error("Unknown utility function: {name}")]
    UnknownUtilityFunction { name: String },
}

/// Read access to the run plus its random stream
///
/// The state is borrowed immutably: choosing a product never mutates it.
/// The adoption itself is applied by the caller afterwards.
pub struct DecisionContext<'a> {
    pub time: f64,
    pub state: &'a SimulationState,
    pub rng: &'a mut RngManager,
}

impl<'a> DecisionContext<'a> {
    pub fn new(time: f64, state: &'a SimulationState, rng: &'a mut RngManager) -> Self {
        Self { time, state, rng }
    }

    pub fn market(&self) -> &Market {
        self.state.market()
    }

    pub fn graph(&self) -> &dyn SocialGraph {
        self.state.graph()
    }

    /// How many of `agent`'s neighbours hold `product`
    pub fn neighbor_adoptions(&self, agent: &ConsumerAgent, product: &str) -> usize {
        self.state.count_neighbor_adoptions(agent.id(), product)
    }

    /// Look up a product and its group, or fail
    pub fn product_with_group(&self, product: &str) -> Result<(&Product, &ProductGroup), DecisionError> {
        let market = self.state.market();
        let entry = market
            .product(product)
            .ok_or_else(|| DecisionError::UnknownProduct {
                product: product.to_string(),
            })?;
        let group = market
            .group(&entry.group)
            .ok_or_else(|| DecisionError::UnknownProductGroup {
                group: entry.group.clone(),
            })?;
        Ok((entry, group))
    }
}

/// A strategy for choosing among candidate products
pub trait DecisionProcess: Debug {
    /// Name the strategy was registered under
    fn name(&self) -> &str;

    /// Pick one of `candidates`
    ///
    /// Fails with `NoCandidates` on an empty list.
    fn choose_product(
        &self,
        candidates: &[String],
        agent: &ConsumerAgent,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<String, DecisionError>;

    /// Whether some alternative strictly beats `candidate`
    fn is_better_available(
        &self,
        candidate: &str,
        alternatives: &[String],
        agent: &ConsumerAgent,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<bool, DecisionError>;
}

/// Guard shared by every strategy
pub(crate) fn ensure_candidates(candidates: &[String], agent: &ConsumerAgent) -> Result<(), DecisionError> {
    if candidates.is_empty() {
        return Err(DecisionError::NoCandidates {
            agent: agent.id().to_string(),
        });
    }
    Ok(())
}
