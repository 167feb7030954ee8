//! Utilitarian choice with bounded noise
//!
//! Each candidate's utility is the sum of its attributes' partial utilities
//! plus a uniform perturbation from `[-ε, ε]`. Utilities are floored at 0
//! and divided by the best utility among every product the agent knows,
//! raised by `ε` as an upper bound for the noise. The candidate with the
//! highest normalized utility wins; the first maximum in candidate order
//! wins ties.

use crate::decision::utility::{product_utility, UtilityFunction};
use crate::decision::{ensure_candidates, DecisionContext, DecisionError, DecisionProcess};
use crate::models::agent::ConsumerAgent;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct KieslingDecision {
    name: String,
    range_epsilon: f64,
    utility: Arc<dyn UtilityFunction>,
}

impl KieslingDecision {
    /// # Panics
    ///
    /// In debug builds, if `range_epsilon` is negative.
    pub fn new(name: impl Into<String>, range_epsilon: f64, utility: Arc<dyn UtilityFunction>) -> Self {
        debug_assert!(range_epsilon >= 0.0, "range_epsilon must be non-negative");
        Self {
            name: name.into(),
            range_epsilon,
            utility,
        }
    }

    pub fn range_epsilon(&self) -> f64 {
        self.range_epsilon
    }

    /// Utility without noise
    fn base_utility(&self, product: &str, agent: &ConsumerAgent, ctx: &DecisionContext<'_>) -> Result<f64, DecisionError> {
        let (entry, _) = ctx.product_with_group(product)?;
        Ok(product_utility(
            self.utility.as_ref(),
            agent,
            entry,
            ctx.market(),
            ctx.time,
        ))
    }

    /// Upper bound every normalized utility is divided by
    ///
    /// Aware products that left the market still count; they set the
    /// agent's expectations.
    fn max_achievable(
        &self,
        candidates: &[String],
        agent: &ConsumerAgent,
        ctx: &DecisionContext<'_>,
    ) -> Result<f64, DecisionError> {
        let mut best = f64::NEG_INFINITY;
        let known = agent
            .aware_products()
            .filter(|p| ctx.market().product(p).is_some())
            .chain(candidates.iter().map(String::as_str));
        for product in known {
            best = best.max(self.base_utility(product, agent, ctx)?);
        }
        Ok(best + self.range_epsilon)
    }

    /// Normalized, perturbed utility of each candidate, in candidate order
    ///
    /// Every value lies in `[0, 1]`. Consumes one random draw per candidate
    /// when `ε > 0`, none otherwise.
    pub fn normalized_utilities(
        &self,
        candidates: &[String],
        agent: &ConsumerAgent,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<Vec<(String, f64)>, DecisionError> {
        let max = self.max_achievable(candidates, agent, ctx)?;
        let mut scored = Vec::with_capacity(candidates.len());
        for product in candidates {
            let mut utility = self.base_utility(product, agent, ctx)?;
            if self.range_epsilon > 0.0 {
                utility += ctx.rng.uniform(-self.range_epsilon, self.range_epsilon);
            }
            let normalized = if max > 0.0 {
                (utility.max(0.0) / max).clamp(0.0, 1.0)
            } else {
                0.0
            };
            scored.push((product.clone(), normalized));
        }
        Ok(scored)
    }
}

impl DecisionProcess for KieslingDecision {
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
        let scored = self.normalized_utilities(candidates, agent, ctx)?;

        let mut best: Option<(String, f64)> = None;
        for (product, utility) in scored {
            trace!(agent = agent.id(), product = %product, utility, "kiesling utility");
            if best.as_ref().map_or(true, |(_, u)| utility > *u) {
                best = Some((product, utility));
            }
        }
        best.map(|(product, _)| product)
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
        let own = self.base_utility(candidate, agent, ctx)?;
        for alternative in alternatives.iter().filter(|a| a.as_str() != candidate) {
            if self.base_utility(alternative, agent, ctx)? > own {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
