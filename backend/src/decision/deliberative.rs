//! Deliberative weighted choice
//!
//! ```text
//! utility = (1 - snw) * (attitude * w + bc * (1 - w)) + snw * neighbours
//! ```
//!
//! - `attitude`: the product's utility under the configured utility function
//! - `bc`: the agent's perceived behavioural control attribute
//! - `snw`: the agent's subjective norm weight attribute
//! - `w`: importance of attitude, configured per consumer group and product
//!   group
//! - `neighbours`: how many of the agent's neighbours hold the product
//!
//! Missing agent attributes count as 0.

use crate::decision::utility::{product_utility, UtilityFunction};
use crate::decision::{ensure_candidates, DecisionContext, DecisionError, DecisionProcess};
use crate::models::agent::{attribute_keys, ConsumerAgent};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// consumer group → product group → importance of attitude
pub type ImportanceAttitudeMap = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone)]
pub struct DeliberativeDecision {
    name: String,
    utility: Arc<dyn UtilityFunction>,
    importance_attitude: ImportanceAttitudeMap,
}

impl DeliberativeDecision {
    pub fn new(
        name: impl Into<String>,
        utility: Arc<dyn UtilityFunction>,
        importance_attitude: ImportanceAttitudeMap,
    ) -> Self {
        Self {
            name: name.into(),
            utility,
            importance_attitude,
        }
    }

    pub fn importance_attitude(&self, consumer_group: &str, product_group: &str) -> Option<f64> {
        self.importance_attitude
            .get(consumer_group)
            .and_then(|groups| groups.get(product_group))
            .copied()
    }

    pub fn utility(&self, product: &str, agent: &ConsumerAgent, ctx: &DecisionContext<'_>) -> Result<f64, DecisionError> {
        let (entry, group) = ctx.product_with_group(product)?;
        let weight = self
            .importance_attitude(agent.group(), &group.name)
            .ok_or_else(|| DecisionError::MissingImportanceAttitude {
                consumer_group: agent.group().to_string(),
                product_group: group.name.clone(),
            })?;

        let attitude = product_utility(self.utility.as_ref(), agent, entry, ctx.market(), ctx.time);
        let control = agent.attribute(attribute_keys::BEHAVIORAL_CONTROL).unwrap_or(0.0);
        let norm_weight = agent
            .attribute(attribute_keys::SUBJECTIVE_NORM_WEIGHT)
            .unwrap_or(0.0);
        let neighbours = ctx.neighbor_adoptions(agent, product) as f64;

        Ok((1.0 - norm_weight) * (attitude * weight + control * (1.0 - weight))
            + norm_weight * neighbours)
    }
}

impl DecisionProcess for DeliberativeDecision {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_product(
        &self,
        candidates: &[String],
        agent: &ConsumerAgent,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<String, DecisionError> {
        ensure_candidates(candidates, agent)?;
        let mut best: Option<(&String, f64)> = None;
        for product in candidates {
            let utility = self.utility(product, agent, ctx)?;
            trace!(agent = agent.id(), product = %product, utility, "deliberative utility");
            if best.map_or(true, |(_, u)| utility > u) {
                best = Some((product, utility));
            }
        }
        best.map(|(product, _)| product.clone())
            .ok_or_else(|| DecisionError::NoCandidates {
                agent: agent.id().to_string(),
            })
    }

    fn is_better_available(
        &self,
        candidate: &str,
        alternatives: &[String],
        agent: &ConsumerAgent,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<bool, DecisionError> {
        let own = self.utility(candidate, agent, ctx)?;
        for alternative in alternatives.iter().filter(|a| a.as_str() != candidate) {
            if self.utility(alternative, agent, ctx)? > own {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
