//! Communication schemes
//!
//! A communication scheme decides which messages an agent sends during the
//! knowledge phase. The kernel wraps each message into a communication event
//! scheduled at the current time.

use crate::models::agent::ConsumerAgent;
use crate::models::graph::SocialGraph;
use crate::models::message::{Message, MessageContent};
use crate::models::state::SimulationState;
use crate::rng::RngManager;
use std::fmt::Debug;

pub trait CommunicationScheme: Debug {
    /// Messages `agent` sends now
    fn create_messages(&self, agent: &ConsumerAgent, state: &SimulationState, rng: &mut RngManager) -> Vec<Message>;
}

/// Talk to one random communication neighbour about one known product
///
/// With probability `contact_probability` per tick the agent picks a
/// communication neighbour and an on-market product it knows, and shares
/// awareness of it along with every attribute it has a perception of.
#[derive(Debug, Clone, PartialEq)]
pub struct WordOfMouthScheme {
    pub contact_probability: f64,
}

impl WordOfMouthScheme {
    pub fn new(contact_probability: f64) -> Self {
        Self {
            contact_probability,
        }
    }
}

impl CommunicationScheme for WordOfMouthScheme {
    fn create_messages(&self, agent: &ConsumerAgent, state: &SimulationState, rng: &mut RngManager) -> Vec<Message> {
        if !rng.chance(self.contact_probability) {
            return Vec::new();
        }

        let partners = state.graph().communication_neighbors(agent.id());
        if partners.is_empty() {
            return Vec::new();
        }
        let time = state.current_time();
        let topics: Vec<&str> = agent
            .aware_products()
            .filter(|p| state.market().is_on_market(p, time))
            .collect();
        if topics.is_empty() {
            return Vec::new();
        }

        let partner = partners[rng.index(partners.len())];
        let product = topics[rng.index(topics.len())];

        let mut messages = vec![Message::new(
            agent.id(),
            partner,
            MessageContent::ProductAwareness {
                product: product.to_string(),
            },
        )];
        if let Some(entry) = state.market().product(product) {
            for attribute in &entry.attributes {
                if let Some(value) = agent.perception(product, &attribute.name) {
                    messages.push(Message::new(
                        agent.id(),
                        partner,
                        MessageContent::AttributePerception {
                            product: product.to_string(),
                            attribute: attribute.name.clone(),
                            value,
                        },
                    ));
                }
            }
        }
        messages
    }
}

/// Never sends anything
#[derive(Debug, Clone, Default)]
pub struct SilentScheme;

impl CommunicationScheme for SilentScheme {
    fn create_messages(&self, _agent: &ConsumerAgent, _state: &SimulationState, _rng: &mut RngManager) -> Vec<Message> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::TimeManager;
    use crate::models::graph::{AdjacencyGraph, EdgeKind};
    use crate::models::product::{Market, Product, ProductGroup};

    fn state() -> SimulationState {
        let mut market = Market::new();
        market.add_group(ProductGroup::new("G"));
        market.add_product(Product::new("P1", "G").with_attribute("eco", 0.8));
        let mut graph = AdjacencyGraph::new();
        graph.add_edge("A", "B", EdgeKind::Communication);
        graph.add_edge("A", "C", EdgeKind::Social);
        SimulationState::new(TimeManager::new(0.0, 1.0), market, graph)
    }

    #[test]
    fn test_word_of_mouth_targets_communication_neighbour() {
        let state = state();
        let mut rng = RngManager::new(11);
        let mut agent = ConsumerAgent::new("A", "H").aware_of("P1");
        agent.perceive("P1", "eco", 0.5);

        let messages = WordOfMouthScheme::new(1.0).create_messages(&agent, &state, &mut rng);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.receiver == "B"));
        assert_eq!(
            messages[0].content,
            MessageContent::ProductAwareness {
                product: "P1".to_string()
            }
        );
    }

    #[test]
    fn test_nothing_to_say_without_awareness() {
        let state = state();
        let mut rng = RngManager::new(11);
        let agent = ConsumerAgent::new("A", "H");
        assert!(WordOfMouthScheme::new(1.0)
            .create_messages(&agent, &state, &mut rng)
            .is_empty());
    }

    #[test]
    fn test_silent_scheme() {
        let state = state();
        let mut rng = RngManager::new(11);
        let agent = ConsumerAgent::new("A", "H").aware_of("P1");
        assert!(SilentScheme.create_messages(&agent, &state, &mut rng).is_empty());
    }
}
