//! Simulation State
//!
//! Everything one run mutates: the agent roster, the market, the social
//! graph and the clock. The scheduler, RNG and decision registry live next
//! to it in the per-run `SimulationContext`.
//!
//! # Critical Invariants
//!
//! 1. **Roster order**: agents are iterated in id order
//! 2. **Adoption implies awareness**: every held product is also known
//! 3. **Discontinuation wipes**: a discontinued product is neither known
//!    nor held by any agent

use crate::core::time::TimeManager;
use crate::models::agent::{AdoptedProduct, ConsumerAgent};
use crate::models::graph::{AdjacencyGraph, SocialGraph};
use crate::models::product::Market;
use std::collections::BTreeMap;

/// Complete simulation state
///
/// # Example
///
/// ```rust
/// use adoption_simulator_core_rs::{ConsumerAgent, Market, SimulationState, TimeManager};
/// use adoption_simulator_core_rs::models::graph::AdjacencyGraph;
///
/// let mut state = SimulationState::new(TimeManager::new(0.0, 1.0), Market::new(), AdjacencyGraph::new());
/// state.add_agent(ConsumerAgent::new("A1", "households"));
/// assert_eq!(state.num_agents(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SimulationState {
    time: TimeManager,
    agents: BTreeMap<String, ConsumerAgent>,
    market: Market,
    graph: AdjacencyGraph,
}

impl SimulationState {
    pub fn new(time: TimeManager, market: Market, graph: AdjacencyGraph) -> Self {
        Self {
            time,
            agents: BTreeMap::new(),
            market,
            graph,
        }
    }

    // ========================================================================
    // Time
    // ========================================================================

    pub fn current_time(&self) -> f64 {
        self.time.current_time()
    }

    pub fn current_tick(&self) -> usize {
        self.time.current_tick()
    }

    pub fn time_manager(&self) -> &TimeManager {
        &self.time
    }

    pub fn advance_tick(&mut self) {
        self.time.advance_tick();
    }

    // ========================================================================
    // Agents
    // ========================================================================

    /// Add an agent, replacing any agent with the same id
    pub fn add_agent(&mut self, agent: ConsumerAgent) {
        self.agents.insert(agent.id().to_string(), agent);
    }

    pub fn get_agent(&self, id: &str) -> Option<&ConsumerAgent> {
        self.agents.get(id)
    }

    pub fn get_agent_mut(&mut self, id: &str) -> Option<&mut ConsumerAgent> {
        self.agents.get_mut(id)
    }

    /// Agent ids in roster order
    pub fn agent_ids(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = &ConsumerAgent> {
        self.agents.values()
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    // ========================================================================
    // Market and graph
    // ========================================================================

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn market_mut(&mut self) -> &mut Market {
        &mut self.market
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut AdjacencyGraph {
        &mut self.graph
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of `agent`'s neighbours currently holding `product`
    pub fn count_neighbor_adoptions(&self, agent: &str, product: &str) -> usize {
        self.graph
            .neighbors(agent)
            .into_iter()
            .filter_map(|id| self.agents.get(id))
            .filter(|neighbor| neighbor.has_adopted(product))
            .count()
    }

    /// Number of agents currently holding `product`
    pub fn adopter_count(&self, product: &str) -> usize {
        self.agents
            .values()
            .filter(|agent| agent.has_adopted(product))
            .count()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Remove every adoption whose expiration date lies before `time`
    pub fn expire_adoptions(&mut self, time: f64) -> Vec<AdoptedProduct> {
        self.agents
            .values_mut()
            .flat_map(|agent| agent.expire_adoptions(time))
            .collect()
    }

    /// Put a product on the market at `time`
    ///
    /// Moves the introduction date earlier if needed; returns false for an
    /// unknown or historically discontinued product.
    pub fn introduce_product(&mut self, product: &str, time: f64) -> bool {
        match self.market.product_mut(product) {
            Some(entry) if !entry.is_historically_discontinued() => {
                if entry.introduced_at > time {
                    entry.introduced_at = time;
                }
                true
            }
            _ => false,
        }
    }

    /// Take a product off the market for good
    ///
    /// Marks the product discontinued at `time` and wipes it from every
    /// agent. Events already queued for it turn into no-ops.
    /// Returns the wiped adoptions, or None for an unknown product.
    pub fn discontinue_product(&mut self, product: &str, time: f64) -> Option<Vec<AdoptedProduct>> {
        let entry = self.market.product_mut(product)?;
        if entry.discontinued_at.map_or(true, |d| d > time) {
            entry.discontinued_at = Some(time);
        }
        Some(
            self.agents
                .values_mut()
                .filter_map(|agent| agent.wipe_product(product))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::graph::EdgeKind;
    use crate::models::product::{Product, ProductGroup};

    fn state_with_two_agents() -> SimulationState {
        let mut market = Market::new();
        market.add_group(ProductGroup::new("G"));
        market.add_product(Product::new("P1", "G"));

        let mut graph = AdjacencyGraph::new();
        graph.add_edge("A", "B", EdgeKind::Social);

        let mut state = SimulationState::new(TimeManager::new(0.0, 1.0), market, graph);
        state.add_agent(ConsumerAgent::new("A", "H"));
        state.add_agent(ConsumerAgent::new("B", "H"));
        state
    }

    #[test]
    fn test_neighbor_adoption_count() {
        let mut state = state_with_two_agents();
        assert_eq!(state.count_neighbor_adoptions("A", "P1"), 0);

        state
            .get_agent_mut("B")
            .unwrap()
            .adopt(AdoptedProduct::new("P1", "B", 0.0, 10.0))
            .unwrap();

        assert_eq!(state.count_neighbor_adoptions("A", "P1"), 1);
        // Edge is directed
        assert_eq!(state.count_neighbor_adoptions("B", "P1"), 0);
        assert_eq!(state.adopter_count("P1"), 1);
    }

    #[test]
    fn test_discontinue_wipes_every_agent() {
        let mut state = state_with_two_agents();
        state.get_agent_mut("A").unwrap().make_aware("P1");
        state
            .get_agent_mut("B")
            .unwrap()
            .adopt(AdoptedProduct::new("P1", "B", 0.0, 10.0))
            .unwrap();

        let wiped = state.discontinue_product("P1", 3.0).unwrap();
        assert_eq!(wiped.len(), 1);
        assert!(!state.get_agent("A").unwrap().is_aware("P1"));
        assert!(!state.get_agent("B").unwrap().has_adopted("P1"));
        assert!(!state.market().is_on_market("P1", 3.0));
        assert!(state.discontinue_product("missing", 3.0).is_none());
    }
}
