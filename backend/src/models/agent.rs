//! Consumer agent model
//!
//! A consumer agent carries:
//! - value preferences (cues for lexicographic decisions)
//! - numeric attributes (subjective norm weight, behavioural control, ...)
//! - needs, and which of them already have a need event pending
//! - product awareness and perceived attribute values
//! - currently held adoptions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Well-known agent attribute names read by decision processes
pub mod attribute_keys {
    /// Weight of the neighbour-adoption term in deliberative decisions
    pub const SUBJECTIVE_NORM_WEIGHT: &str = "subjective_norm_weight";
    /// Perceived behavioural control in deliberative decisions
    pub const BEHAVIORAL_CONTROL: &str = "behavioral_control";
    /// Strength of the social-norm cue in Schwarz take-the-best
    pub const SOCIAL_NORM: &str = "social_norm";
}

/// Errors that can occur during agent operations
#[derive(Debug, Error, PartialEq)]
pub enum AgentError {
    #[error("Agent {agent} already holds product {product}")]
    AlreadyAdopted { agent: String, product: String },

    #[error("Adoption of {product} belongs to {adopter}, not {agent}")]
    ForeignAdoption {
        agent: String,
        adopter: String,
        product: String,
    },
}

/// A value preference: a named value and how strongly the agent holds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePreference {
    pub value: String,
    pub strength: f64,
}

/// A product currently held by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptedProduct {
    product: String,
    adopter: String,
    adoption_time: f64,
    lifetime: f64,
    /// Whether the adopter already recommended this adoption to someone
    recommended: bool,
}

impl AdoptedProduct {
    pub fn new(
        product: impl Into<String>,
        adopter: impl Into<String>,
        adoption_time: f64,
        lifetime: f64,
    ) -> Self {
        Self {
            product: product.into(),
            adopter: adopter.into(),
            adoption_time,
            lifetime,
            recommended: false,
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn adopter(&self) -> &str {
        &self.adopter
    }

    pub fn adoption_time(&self) -> f64 {
        self.adoption_time
    }

    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    /// Time after which the adoption lapses
    pub fn expiration_date(&self) -> f64 {
        self.adoption_time + self.lifetime
    }

    pub fn is_expired_at(&self, time: f64) -> bool {
        self.expiration_date() < time
    }

    pub fn is_recommended(&self) -> bool {
        self.recommended
    }
}

/// Represents a consumer agent
///
/// # Example
/// ```
/// use adoption_simulator_core_rs::ConsumerAgent;
///
/// let mut agent = ConsumerAgent::new("A1", "households")
///     .with_preference("eco", 1.0)
///     .with_need("heating");
///
/// assert!(agent.make_aware("P1"));
/// assert!(!agent.make_aware("P1")); // already aware
/// assert!(agent.is_aware("P1"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerAgent {
    id: String,
    group: String,
    preferences: Vec<ValuePreference>,
    attributes: BTreeMap<String, f64>,
    needs: BTreeSet<String>,
    pending_needs: BTreeSet<String>,
    awareness: BTreeSet<String>,
    /// product → attribute → perceived value
    perceptions: BTreeMap<String, BTreeMap<String, f64>>,
    adopted: Vec<AdoptedProduct>,
}

impl ConsumerAgent {
    pub fn new(id: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            preferences: Vec::new(),
            attributes: BTreeMap::new(),
            needs: BTreeSet::new(),
            pending_needs: BTreeSet::new(),
            awareness: BTreeSet::new(),
            perceptions: BTreeMap::new(),
            adopted: Vec::new(),
        }
    }

    pub fn with_preference(mut self, value: impl Into<String>, strength: f64) -> Self {
        self.preferences.push(ValuePreference {
            value: value.into(),
            strength,
        });
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_need(mut self, need: impl Into<String>) -> Self {
        self.needs.insert(need.into());
        self
    }

    pub fn aware_of(mut self, product: impl Into<String>) -> Self {
        self.awareness.insert(product.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn preferences(&self) -> &[ValuePreference] {
        &self.preferences
    }

    /// Preferences ordered by descending strength
    ///
    /// Equal strengths keep their declaration order.
    pub fn preferences_by_strength(&self) -> Vec<&ValuePreference> {
        let mut ordered: Vec<&ValuePreference> = self.preferences.iter().collect();
        ordered.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        ordered
    }

    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: f64) {
        self.attributes.insert(name.into(), value);
    }

    // ========================================================================
    // Needs
    // ========================================================================

    pub fn needs(&self) -> &BTreeSet<String> {
        &self.needs
    }

    pub fn add_need(&mut self, need: impl Into<String>) -> bool {
        self.needs.insert(need.into())
    }

    pub fn is_need_pending(&self, need: &str) -> bool {
        self.pending_needs.contains(need)
    }

    /// Mark a need as having an event in flight; false if it already had one
    pub fn mark_need_pending(&mut self, need: &str) -> bool {
        self.pending_needs.insert(need.to_string())
    }

    pub fn clear_need_pending(&mut self, need: &str) {
        self.pending_needs.remove(need);
    }

    // ========================================================================
    // Awareness and perception
    // ========================================================================

    /// Become aware of a product; true if the agent was not aware before
    pub fn make_aware(&mut self, product: impl Into<String>) -> bool {
        self.awareness.insert(product.into())
    }

    pub fn is_aware(&self, product: &str) -> bool {
        self.awareness.contains(product)
    }

    /// Products the agent is aware of, in id order
    pub fn aware_products(&self) -> impl Iterator<Item = &str> {
        self.awareness.iter().map(String::as_str)
    }

    pub fn perceive(&mut self, product: &str, attribute: &str, value: f64) {
        self.perceptions
            .entry(product.to_string())
            .or_default()
            .insert(attribute.to_string(), value);
    }

    /// Perceived value of a product attribute, if the agent holds one
    pub fn perception(&self, product: &str, attribute: &str) -> Option<f64> {
        self.perceptions
            .get(product)
            .and_then(|attrs| attrs.get(attribute))
            .copied()
    }

    // ========================================================================
    // Adoptions
    // ========================================================================

    pub fn adopted_products(&self) -> &[AdoptedProduct] {
        &self.adopted
    }

    pub fn has_adopted(&self, product: &str) -> bool {
        self.adopted.iter().any(|a| a.product == product)
    }

    pub fn adoption(&self, product: &str) -> Option<&AdoptedProduct> {
        self.adopted.iter().find(|a| a.product == product)
    }

    /// Record an adoption
    ///
    /// An adopted product is always also an aware product.
    pub fn adopt(&mut self, adoption: AdoptedProduct) -> Result<(), AgentError> {
        if adoption.adopter != self.id {
            return Err(AgentError::ForeignAdoption {
                agent: self.id.clone(),
                adopter: adoption.adopter.clone(),
                product: adoption.product.clone(),
            });
        }
        if self.has_adopted(&adoption.product) {
            return Err(AgentError::AlreadyAdopted {
                agent: self.id.clone(),
                product: adoption.product.clone(),
            });
        }
        self.awareness.insert(adoption.product.clone());
        self.adopted.push(adoption);
        Ok(())
    }

    /// Mark an adoption as recommended; true if it was not before
    pub fn mark_recommended(&mut self, product: &str) -> bool {
        match self.adopted.iter_mut().find(|a| a.product == product) {
            Some(adoption) if !adoption.recommended => {
                adoption.recommended = true;
                true
            }
            _ => false,
        }
    }

    /// Remove and return adoptions whose expiration date lies before `time`
    pub fn expire_adoptions(&mut self, time: f64) -> Vec<AdoptedProduct> {
        let (expired, kept): (Vec<_>, Vec<_>) = self
            .adopted
            .drain(..)
            .partition(|a| a.is_expired_at(time));
        self.adopted = kept;
        expired
    }

    /// Forget a product entirely (awareness, perceptions, holdings)
    ///
    /// Returns the removed adoption, if the product was held.
    pub fn wipe_product(&mut self, product: &str) -> Option<AdoptedProduct> {
        self.awareness.remove(product);
        self.perceptions.remove(product);
        let index = self.adopted.iter().position(|a| a.product == product)?;
        Some(self.adopted.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adopt_makes_aware() {
        let mut agent = ConsumerAgent::new("A1", "G");
        agent
            .adopt(AdoptedProduct::new("P1", "A1", 0.0, 5.0))
            .unwrap();
        assert!(agent.is_aware("P1"));
        assert!(agent.has_adopted("P1"));
    }

    #[test]
    fn test_double_adoption_rejected() {
        let mut agent = ConsumerAgent::new("A1", "G");
        agent
            .adopt(AdoptedProduct::new("P1", "A1", 0.0, 5.0))
            .unwrap();
        let err = agent
            .adopt(AdoptedProduct::new("P1", "A1", 1.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, AgentError::AlreadyAdopted { .. }));
    }

    #[test]
    fn test_foreign_adoption_rejected() {
        let mut agent = ConsumerAgent::new("A1", "G");
        let err = agent
            .adopt(AdoptedProduct::new("P1", "A2", 0.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, AgentError::ForeignAdoption { .. }));
    }

    #[test]
    fn test_expiry_is_strict() {
        let mut agent = ConsumerAgent::new("A1", "G");
        agent
            .adopt(AdoptedProduct::new("P1", "A1", 0.0, 5.0))
            .unwrap();

        // Expiration date 5.0 is not before 5.0
        assert!(agent.expire_adoptions(5.0).is_empty());
        let expired = agent.expire_adoptions(5.5);
        assert_eq!(expired.len(), 1);
        assert!(!agent.has_adopted("P1"));
        // Awareness survives expiry
        assert!(agent.is_aware("P1"));
    }

    #[test]
    fn test_preferences_by_strength_is_stable() {
        let agent = ConsumerAgent::new("A1", "G")
            .with_preference("a", 0.5)
            .with_preference("b", 0.9)
            .with_preference("c", 0.5);
        let order: Vec<&str> = agent
            .preferences_by_strength()
            .iter()
            .map(|p| p.value.as_str())
            .collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_recommend_once() {
        let mut agent = ConsumerAgent::new("A1", "G");
        agent
            .adopt(AdoptedProduct::new("P1", "A1", 0.0, 5.0))
            .unwrap();
        assert!(agent.mark_recommended("P1"));
        assert!(!agent.mark_recommended("P1"));
        assert!(!agent.mark_recommended("P2"));
    }

    #[test]
    fn test_wipe_product() {
        let mut agent = ConsumerAgent::new("A1", "G");
        agent.perceive("P1", "eco", 0.4);
        agent
            .adopt(AdoptedProduct::new("P1", "A1", 0.0, 5.0))
            .unwrap();

        let removed = agent.wipe_product("P1");
        assert!(removed.is_some());
        assert!(!agent.is_aware("P1"));
        assert_eq!(agent.perception("P1", "eco"), None);
        assert!(agent.wipe_product("P1").is_none());
    }
}
