//! Messages exchanged between agents
//!
//! The kernel does not decide what agents talk about; communication schemes
//! produce messages and the scheduler delivers them. Delivery applies the
//! content to the receiver and reports what happened, so the event handler
//! can schedule follow-ups (a need awakening turns into a need event).

use crate::models::state::SimulationState;
use serde::{Deserialize, Serialize};

/// What a message tells its receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Receiver learns that a product exists
    ProductAwareness { product: String },

    /// Receiver adopts the sender's view of a product attribute
    AttributePerception {
        product: String,
        attribute: String,
        value: f64,
    },

    /// Receiver develops a need
    NeedAwakening { need: String },
}

/// A message from one agent to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub receiver: String,
    pub content: MessageContent,
}

/// Result of delivering a message
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEffect {
    /// Receiver learned about a product it did not know
    BecameAware { product: String },

    /// Receiver updated a perceived attribute value
    Perceived { product: String, attribute: String },

    /// Receiver now has a need that should be raised
    NeedAwakened { need: String },

    /// Nothing changed; the reason says why
    Ignored { reason: String },
}

impl Message {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, content: MessageContent) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            content,
        }
    }

    /// Apply the message to its receiver at `time`
    ///
    /// Messages about products that are unknown or off the market are
    /// ignored, as are messages to agents that no longer exist.
    pub fn process(&self, state: &mut SimulationState, time: f64) -> MessageEffect {
        if let Some(product) = self.product() {
            if !state.market().is_on_market(product, time) {
                return MessageEffect::Ignored {
                    reason: format!("product {} not on market", product),
                };
            }
        }

        let receiver = match state.get_agent_mut(&self.receiver) {
            Some(agent) => agent,
            None => {
                return MessageEffect::Ignored {
                    reason: format!("receiver {} not found", self.receiver),
                }
            }
        };

        match &self.content {
            MessageContent::ProductAwareness { product } => {
                if receiver.make_aware(product.clone()) {
                    MessageEffect::BecameAware {
                        product: product.clone(),
                    }
                } else {
                    MessageEffect::Ignored {
                        reason: format!("already aware of {}", product),
                    }
                }
            }
            MessageContent::AttributePerception {
                product,
                attribute,
                value,
            } => {
                receiver.make_aware(product.clone());
                receiver.perceive(product, attribute, *value);
                MessageEffect::Perceived {
                    product: product.clone(),
                    attribute: attribute.clone(),
                }
            }
            MessageContent::NeedAwakening { need } => {
                receiver.add_need(need.clone());
                MessageEffect::NeedAwakened { need: need.clone() }
            }
        }
    }

    /// Product the message is about, if any
    pub fn product(&self) -> Option<&str> {
        match &self.content {
            MessageContent::ProductAwareness { product }
            | MessageContent::AttributePerception { product, .. } => Some(product),
            MessageContent::NeedAwakening { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::TimeManager;
    use crate::models::agent::ConsumerAgent;
    use crate::models::graph::AdjacencyGraph;
    use crate::models::product::{Market, Product, ProductGroup};

    fn state() -> SimulationState {
        let mut market = Market::new();
        market.add_group(ProductGroup::new("G"));
        market.add_product(Product::new("P1", "G"));
        let mut state = SimulationState::new(TimeManager::new(0.0, 1.0), market, AdjacencyGraph::new());
        state.add_agent(ConsumerAgent::new("R", "H"));
        state
    }

    #[test]
    fn test_awareness_message() {
        let mut state = state();
        let msg = Message::new(
            "S",
            "R",
            MessageContent::ProductAwareness {
                product: "P1".to_string(),
            },
        );
        assert_eq!(
            msg.process(&mut state, 0.0),
            MessageEffect::BecameAware {
                product: "P1".to_string()
            }
        );
        assert!(matches!(msg.process(&mut state, 0.0), MessageEffect::Ignored { .. }));
    }

    #[test]
    fn test_perception_message_updates_receiver() {
        let mut state = state();
        let msg = Message::new(
            "S",
            "R",
            MessageContent::AttributePerception {
                product: "P1".to_string(),
                attribute: "eco".to_string(),
                value: 0.2,
            },
        );
        msg.process(&mut state, 0.0);
        let receiver = state.get_agent("R").unwrap();
        assert!(receiver.is_aware("P1"));
        assert_eq!(receiver.perception("P1", "eco"), Some(0.2));
    }

    #[test]
    fn test_message_about_unknown_product_ignored() {
        let mut state = state();
        let msg = Message::new(
            "S",
            "R",
            MessageContent::ProductAwareness {
                product: "nope".to_string(),
            },
        );
        assert!(matches!(msg.process(&mut state, 0.0), MessageEffect::Ignored { .. }));
        assert!(!state.get_agent("R").unwrap().is_aware("nope"));
    }
}
