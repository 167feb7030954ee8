//! Utility functions
//!
//! A utility function scores one product attribute for one agent. Decision
//! strategies compose them: a product's utility is the sum of its attributes'
//! partial utilities, a cue utility restricts that sum to one preference.

use crate::models::agent::{ConsumerAgent, ValuePreference};
use crate::models::product::{Market, Product, ProductAttribute};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Attribute value as the agent sees it
///
/// Perceptions received through messages override the product's own value.
pub fn perceived_value(agent: &ConsumerAgent, product: &Product, attribute: &ProductAttribute) -> f64 {
    agent
        .perception(&product.id, &attribute.name)
        .unwrap_or(attribute.value)
}

/// Stateless scoring of product attributes
pub trait UtilityFunction: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Contribution of one attribute under one value preference
    fn value_utility(
        &self,
        agent: &ConsumerAgent,
        preference: &ValuePreference,
        product: &Product,
        attribute: &ProductAttribute,
        market: &Market,
    ) -> f64;

    /// Contribution of one attribute summed over all preferences
    ///
    /// Built-in functions are time-independent; `time` is available to
    /// implementations that discount or age attributes.
    fn partial_utility(
        &self,
        agent: &ConsumerAgent,
        product: &Product,
        attribute: &ProductAttribute,
        market: &Market,
        _time: f64,
    ) -> f64 {
        agent
            .preferences()
            .iter()
            .map(|pref| self.value_utility(agent, pref, product, attribute, market))
            .sum()
    }
}

/// Utility of a whole product: sum of partial utilities over its attributes
pub fn product_utility(
    function: &dyn UtilityFunction,
    agent: &ConsumerAgent,
    product: &Product,
    market: &Market,
    time: f64,
) -> f64 {
    product
        .attributes
        .iter()
        .map(|attr| function.partial_utility(agent, product, attr, market, time))
        .sum()
}

/// Utility of a product under a single cue (one value preference)
pub fn cue_utility(
    function: &dyn UtilityFunction,
    agent: &ConsumerAgent,
    preference: &ValuePreference,
    product: &Product,
    market: &Market,
) -> f64 {
    product
        .attributes
        .iter()
        .map(|attr| function.value_utility(agent, preference, product, attr, market))
        .sum()
}

/// strength × mapping strength × perceived value
#[derive(Debug, Clone, Default)]
pub struct ValueMappingUtility;

impl UtilityFunction for ValueMappingUtility {
    fn name(&self) -> &str {
        "ValueMapping"
    }

    fn value_utility(
        &self,
        agent: &ConsumerAgent,
        preference: &ValuePreference,
        product: &Product,
        attribute: &ProductAttribute,
        market: &Market,
    ) -> f64 {
        let mapping = market
            .group(&product.group)
            .map_or(0.0, |g| g.mapping_strength(&preference.value, &attribute.name));
        preference.strength * mapping * perceived_value(agent, product, attribute)
    }
}

/// strength × perceived value, for attributes the group maps to the value
#[derive(Debug, Clone, Default)]
pub struct PerceivedValueUtility;

impl UtilityFunction for PerceivedValueUtility {
    fn name(&self) -> &str {
        "PerceivedValue"
    }

    fn value_utility(
        &self,
        agent: &ConsumerAgent,
        preference: &ValuePreference,
        product: &Product,
        attribute: &ProductAttribute,
        market: &Market,
    ) -> f64 {
        let mapped = market
            .group(&product.group)
            .is_some_and(|g| g.maps(&preference.value, &attribute.name));
        if mapped {
            preference.strength * perceived_value(agent, product, attribute)
        } else {
            0.0
        }
    }
}

/// Utility functions available to decision processes, by name
#[derive(Debug, Clone)]
pub struct UtilityRegistry {
    functions: BTreeMap<String, Arc<dyn UtilityFunction>>,
}

impl UtilityRegistry {
    /// Registry holding only the built-in functions
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            functions: BTreeMap::new(),
        };
        registry.register(Arc::new(ValueMappingUtility));
        registry.register(Arc::new(PerceivedValueUtility));
        registry
    }

    pub fn register(&mut self, function: Arc<dyn UtilityFunction>) {
        self.functions.insert(function.name().to_string(), function);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn UtilityFunction>> {
        self.functions.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }
}

impl Default for UtilityRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
