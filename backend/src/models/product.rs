//! Products, product groups and the market that holds them
//!
//! A product belongs to exactly one product group. The group carries
//! everything shared by its members:
//! - value → attribute mappings used by preference-based utilities
//! - the needs its products satisfy
//! - an optional exclusivity tag (holding one tagged product blocks others)
//! - an optional standard product (last-resort decision outcome)
//! - an optional decision-process override

use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A named numeric attribute of a product (e.g. "price", "eco")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    pub value: f64,
}

/// How strongly a value preference maps onto a product attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMapping {
    /// Value preference name (e.g. "environmental_concern")
    pub value: String,
    /// Product-group attribute name (e.g. "eco")
    pub attribute: String,
    /// Mapping strength, usually in [-1, 1]
    pub strength: f64,
}

/// Distribution an adoption lifetime is drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifetimeDistribution {
    /// Always the same lifetime
    Fixed { value: f64 },

    /// Uniform in [min, max)
    Uniform { min: f64, max: f64 },

    /// Normal with mean and standard deviation
    Normal { mean: f64, std_dev: f64 },
}

impl LifetimeDistribution {
    /// Draw a lifetime; never negative
    pub fn sample(&self, rng: &mut RngManager) -> f64 {
        let raw = match self {
            LifetimeDistribution::Fixed { value } => *value,
            LifetimeDistribution::Uniform { min, max } => rng.uniform(*min, *max),
            LifetimeDistribution::Normal { mean, std_dev } => {
                mean + std_dev * rng.standard_normal()
            }
        };
        raw.max(0.0)
    }
}

impl Default for LifetimeDistribution {
    fn default() -> Self {
        LifetimeDistribution::Fixed { value: f64::INFINITY }
    }
}

/// Product group shared configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub name: String,

    #[serde(default)]
    pub value_mappings: Vec<ValueMapping>,

    /// Needs satisfied by every product of this group
    #[serde(default)]
    pub satisfied_needs: BTreeSet<String>,

    /// Products sharing an exclusivity tag cannot be held simultaneously
    #[serde(default)]
    pub exclusivity: Option<String>,

    /// Designated default product of the group
    #[serde(default)]
    pub standard_product: Option<String>,

    /// Decision process used instead of the adopter's group default
    #[serde(default)]
    pub decision_process: Option<String>,
}

impl ProductGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_mappings: Vec::new(),
            satisfied_needs: BTreeSet::new(),
            exclusivity: None,
            standard_product: None,
            decision_process: None,
        }
    }

    pub fn with_mapping(
        mut self,
        value: impl Into<String>,
        attribute: impl Into<String>,
        strength: f64,
    ) -> Self {
        self.value_mappings.push(ValueMapping {
            value: value.into(),
            attribute: attribute.into(),
            strength,
        });
        self
    }

    pub fn satisfying(mut self, need: impl Into<String>) -> Self {
        self.satisfied_needs.insert(need.into());
        self
    }

    pub fn with_exclusivity(mut self, tag: impl Into<String>) -> Self {
        self.exclusivity = Some(tag.into());
        self
    }

    pub fn with_standard_product(mut self, product: impl Into<String>) -> Self {
        self.standard_product = Some(product.into());
        self
    }

    pub fn with_decision_process(mut self, name: impl Into<String>) -> Self {
        self.decision_process = Some(name.into());
        self
    }

    /// Combined strength of all mappings from `value` onto `attribute`
    ///
    /// Zero when the value does not map onto the attribute.
    pub fn mapping_strength(&self, value: &str, attribute: &str) -> f64 {
        self.value_mappings
            .iter()
            .filter(|m| m.value == value && m.attribute == attribute)
            .map(|m| m.strength)
            .sum()
    }

    /// Whether `value` maps onto `attribute` at all
    pub fn maps(&self, value: &str, attribute: &str) -> bool {
        self.value_mappings
            .iter()
            .any(|m| m.value == value && m.attribute == attribute)
    }

    pub fn satisfies(&self, need: &str) -> bool {
        self.satisfied_needs.contains(need)
    }
}

/// A product agents can become aware of and adopt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub group: String,

    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,

    #[serde(default)]
    pub lifetime: LifetimeDistribution,

    /// First time the product is on the market
    #[serde(default)]
    pub introduced_at: f64,

    /// Time the product left the market, if it did
    #[serde(default)]
    pub discontinued_at: Option<f64>,
}

impl Product {
    pub fn new(id: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            attributes: Vec::new(),
            lifetime: LifetimeDistribution::default(),
            introduced_at: f64::NEG_INFINITY,
            discontinued_at: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.push(ProductAttribute {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_lifetime(mut self, lifetime: LifetimeDistribution) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn introduced_at(mut self, time: f64) -> Self {
        self.introduced_at = time;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value)
    }

    /// Discontinued at or before `time`
    pub fn is_discontinued(&self, time: f64) -> bool {
        self.discontinued_at.is_some_and(|d| d <= time)
    }

    /// Introduced and not yet discontinued at `time`
    pub fn is_on_market(&self, time: f64) -> bool {
        self.introduced_at <= time && !self.is_discontinued(time)
    }

    /// Ever discontinued, regardless of the current time
    pub fn is_historically_discontinued(&self) -> bool {
        self.discontinued_at.is_some()
    }
}

/// All products and product groups of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Market {
    products: BTreeMap<String, Product>,
    groups: BTreeMap<String, ProductGroup>,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, group: ProductGroup) {
        self.groups.insert(group.name.clone(), group);
    }

    pub fn add_product(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.get_mut(id)
    }

    pub fn group(&self, name: &str) -> Option<&ProductGroup> {
        self.groups.get(name)
    }

    /// Group of a product, if both exist
    pub fn group_of(&self, product_id: &str) -> Option<&ProductGroup> {
        self.products
            .get(product_id)
            .and_then(|p| self.groups.get(&p.group))
    }

    /// All products in id order
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// All product groups in name order
    pub fn groups(&self) -> impl Iterator<Item = &ProductGroup> {
        self.groups.values()
    }

    pub fn num_products(&self) -> usize {
        self.products.len()
    }

    /// Whether the product exists and is on the market at `time`
    pub fn is_on_market(&self, product_id: &str, time: f64) -> bool {
        self.products
            .get(product_id)
            .is_some_and(|p| p.is_on_market(time))
    }

    /// Whether the product's group satisfies `need`
    pub fn satisfies(&self, product_id: &str, need: &str) -> bool {
        self.group_of(product_id).is_some_and(|g| g.satisfies(need))
    }

    /// Exclusivity tag of the product's group
    pub fn exclusivity_of(&self, product_id: &str) -> Option<&str> {
        self.group_of(product_id)
            .and_then(|g| g.exclusivity.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_strength_sums_matching_entries() {
        let group = ProductGroup::new("PV")
            .with_mapping("eco", "emissions", 0.5)
            .with_mapping("eco", "emissions", 0.25)
            .with_mapping("thrift", "price", -1.0);

        assert_eq!(group.mapping_strength("eco", "emissions"), 0.75);
        assert_eq!(group.mapping_strength("eco", "price"), 0.0);
        assert!(group.maps("thrift", "price"));
        assert!(!group.maps("thrift", "emissions"));
    }

    #[test]
    fn test_market_window() {
        let mut product = Product::new("P1", "PV").introduced_at(5.0);
        assert!(!product.is_on_market(4.0));
        assert!(product.is_on_market(5.0));

        product.discontinued_at = Some(8.0);
        assert!(product.is_on_market(7.9));
        assert!(!product.is_on_market(8.0));
        assert!(product.is_historically_discontinued());
    }

    #[test]
    fn test_lifetime_never_negative() {
        let mut rng = RngManager::new(3);
        let dist = LifetimeDistribution::Normal {
            mean: -10.0,
            std_dev: 1.0,
        };
        for _ in 0..100 {
            assert_eq!(dist.sample(&mut rng), 0.0);
        }
    }

    #[test]
    fn test_fixed_lifetime_consumes_no_randomness() {
        let mut rng = RngManager::new(3);
        let before = rng.get_state();
        let dist = LifetimeDistribution::Fixed { value: 12.0 };
        assert_eq!(dist.sample(&mut rng), 12.0);
        assert_eq!(rng.get_state(), before);
    }
}
