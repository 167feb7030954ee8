//! Simulation configuration
//!
//! One serde document describes a whole run. `validate` checks structural
//! consistency (ids, references, numeric ranges); decision-process names
//! and parameters are checked when the decision configuration is built.

use crate::events::types::ScriptedEvent;
use crate::models::agent::ValuePreference;
use crate::models::graph::EdgeKind;
use crate::models::product::{Product, ProductGroup};
use crate::orchestrator::engine::SimulationError;
use crate::schemes::{CommunicationConfig, NeedDevelopmentConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

fn default_tick_length() -> f64 {
    1.0
}

fn default_edge_kind() -> EdgeKind {
    EdgeKind::Social
}

/// Complete description of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub start_time: f64,

    #[serde(default = "default_tick_length")]
    pub tick_length: f64,

    pub num_ticks: usize,

    #[serde(default)]
    pub rng_seed: u64,

    /// Raw decision-process records by name
    #[serde(default)]
    pub decision_processes: BTreeMap<String, Value>,

    pub consumer_groups: Vec<ConsumerGroupConfig>,

    #[serde(default)]
    pub product_groups: Vec<ProductGroup>,

    #[serde(default)]
    pub products: Vec<Product>,

    #[serde(default)]
    pub agents: Vec<AgentConfig>,

    #[serde(default)]
    pub edges: Vec<EdgeConfig>,

    #[serde(default)]
    pub scripted_events: Vec<ScriptedEvent>,

    /// Abort instead of skipping events of unsupported kinds
    #[serde(default)]
    pub abort_on_unsupported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerGroupConfig {
    pub name: String,

    /// Default decision process of the group's members
    pub decision_process: String,

    #[serde(default)]
    pub communication: CommunicationConfig,

    #[serde(default)]
    pub need_development: NeedDevelopmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    pub group: String,

    #[serde(default)]
    pub preferences: Vec<ValuePreference>,

    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,

    #[serde(default)]
    pub needs: Vec<String>,

    /// Products the agent knows from the start
    #[serde(default)]
    pub aware_of: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub from: String,
    pub to: String,

    #[serde(default = "default_edge_kind")]
    pub kind: EdgeKind,

    #[serde(default)]
    pub undirected: bool,
}

fn invalid(msg: String) -> SimulationError {
    SimulationError::InvalidConfig(msg)
}

fn unique_ids<'a>(what: &str, ids: impl Iterator<Item = &'a str>) -> Result<BTreeSet<&'a str>, SimulationError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(invalid(format!("Duplicate {} id: {}", what, id)));
        }
    }
    Ok(seen)
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.tick_length.is_finite() || self.tick_length <= 0.0 {
            return Err(invalid(format!("tick_length must be positive, got {}", self.tick_length)));
        }
        if !self.start_time.is_finite() {
            return Err(invalid("start_time must be finite".to_string()));
        }

        let consumer_groups = unique_ids("consumer group", self.consumer_groups.iter().map(|g| g.name.as_str()))?;
        let product_groups = unique_ids("product group", self.product_groups.iter().map(|g| g.name.as_str()))?;
        let products = unique_ids("product", self.products.iter().map(|p| p.id.as_str()))?;
        let agents = unique_ids("agent", self.agents.iter().map(|a| a.id.as_str()))?;

        for group in &self.consumer_groups {
            match group.communication {
                CommunicationConfig::WordOfMouth { contact_probability }
                    if !(0.0..=1.0).contains(&contact_probability) =>
                {
                    return Err(invalid(format!(
                        "Consumer group {}: contact_probability must lie in [0, 1]",
                        group.name
                    )));
                }
                _ => {}
            }
            if let NeedDevelopmentConfig::Active {
                retry_delay: Some(delay),
            } = group.need_development
            {
                if !delay.is_finite() || delay <= 0.0 {
                    return Err(invalid(format!(
                        "Consumer group {}: retry_delay must be positive",
                        group.name
                    )));
                }
            }
        }

        for group in &self.product_groups {
            if let Some(standard) = &group.standard_product {
                let belongs = self
                    .products
                    .iter()
                    .any(|p| &p.id == standard && p.group == group.name);
                if !belongs {
                    return Err(invalid(format!(
                        "Product group {}: standard product {} is not a member",
                        group.name, standard
                    )));
                }
            }
        }

        for product in &self.products {
            if !product_groups.contains(product.group.as_str()) {
                return Err(invalid(format!(
                    "Product {} references unknown group {}",
                    product.id, product.group
                )));
            }
            if let Some(discontinued) = product.discontinued_at {
                if discontinued < product.introduced_at {
                    return Err(invalid(format!(
                        "Product {} is discontinued before it is introduced",
                        product.id
                    )));
                }
            }
        }

        for agent in &self.agents {
            if !consumer_groups.contains(agent.group.as_str()) {
                return Err(invalid(format!(
                    "Agent {} references unknown group {}",
                    agent.id, agent.group
                )));
            }
            if let Some(unknown) = agent.aware_of.iter().find(|p| !products.contains(p.as_str())) {
                return Err(invalid(format!(
                    "Agent {} is aware of unknown product {}",
                    agent.id, unknown
                )));
            }
        }

        for edge in &self.edges {
            for end in [&edge.from, &edge.to] {
                if !agents.contains(end.as_str()) {
                    return Err(invalid(format!("Edge references unknown agent {}", end)));
                }
            }
        }

        for scripted in &self.scripted_events {
            if !scripted.at.is_finite() || scripted.at < self.start_time {
                return Err(invalid(format!(
                    "Scripted event at {} lies before start_time {}",
                    scripted.at, self.start_time
                )));
            }
        }

        Ok(())
    }

    /// (consumer group, default process) pairs
    pub fn consumer_group_processes(&self) -> Vec<(&str, &str)> {
        self.consumer_groups
            .iter()
            .map(|g| (g.name.as_str(), g.decision_process.as_str()))
            .collect()
    }

    /// (product group, override process) pairs
    pub fn product_group_processes(&self) -> Vec<(&str, Option<&str>)> {
        self.product_groups
            .iter()
            .map(|g| (g.name.as_str(), g.decision_process.as_deref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "num_ticks": 3,
            "consumer_groups": [{"name": "H", "decision_process": "Kiesling"}],
            "product_groups": [{"name": "G", "satisfied_needs": ["heat"]}],
            "products": [{"id": "P1", "group": "G"}],
            "agents": [{"id": "A", "group": "H", "aware_of": ["P1"]}],
        })
    }

    #[test]
    fn test_defaults() {
        let config: SimulationConfig = serde_json::from_value(base()).unwrap();
        assert_eq!(config.tick_length, 1.0);
        assert_eq!(config.start_time, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_product_reference() {
        let mut value = base();
        value["agents"][0]["aware_of"] = json!(["nope"]);
        let config: SimulationConfig = serde_json::from_value(value).unwrap();
        assert!(matches!(config.validate(), Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_agent_ids() {
        let mut value = base();
        value["agents"] = json!([{"id": "A", "group": "H"}, {"id": "A", "group": "H"}]);
        let config: SimulationConfig = serde_json::from_value(value).unwrap();
        assert!(matches!(config.validate(), Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_positive_tick_length() {
        let mut value = base();
        value["tick_length"] = json!(0.0);
        let config: SimulationConfig = serde_json::from_value(value).unwrap();
        assert!(config.validate().is_err());
    }
}
