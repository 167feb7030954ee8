//! Lexicographic take-the-best
//!
//! The agent's value preferences, strongest first, form a cue sequence. Each
//! cue narrows the candidate set to those scoring within `TOLERANCE` of the
//! best; the first cue leaving a single survivor decides. Remaining ties go
//! through the fallback chain:
//!
//! 1. most adoptions among the agent's neighbours (imitation)
//! 2. the product group's standard product, if it survived
//! 3. a uniform random pick
//!
//! The Schwarz variant adds a social-norm cue ranked by an agent attribute.
//! When reached, it scores candidates by neighbour adoptions like any other
//! cue instead of only as a final fallback.

use crate::decision::utility::{cue_utility, UtilityFunction};
use crate::decision::{ensure_candidates, DecisionContext, DecisionError, DecisionProcess};
use crate::models::agent::{attribute_keys, ConsumerAgent, ValuePreference};
use std::sync::Arc;
use tracing::trace;

/// Scores within this distance of the best count as tied
pub const TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub enum TakeTheBestVariant {
    Plain,
    Schwarz { social_norm_attribute: String },
}

impl TakeTheBestVariant {
    pub fn schwarz() -> Self {
        TakeTheBestVariant::Schwarz {
            social_norm_attribute: attribute_keys::SOCIAL_NORM.to_string(),
        }
    }
}

/// One step of the cue sequence
#[derive(Debug, Clone, Copy)]
enum Cue<'a> {
    Value(&'a ValuePreference),
    SocialNorm,
}

#[derive(Debug, Clone)]
pub struct TakeTheBestDecision {
    name: String,
    variant: TakeTheBestVariant,
    utility: Arc<dyn UtilityFunction>,
}

impl TakeTheBestDecision {
    pub fn new(name: impl Into<String>, variant: TakeTheBestVariant, utility: Arc<dyn UtilityFunction>) -> Self {
        Self {
            name: name.into(),
            variant,
            utility,
        }
    }

    pub fn variant(&self) -> &TakeTheBestVariant {
        &self.variant
    }

    /// Cue sequence for `agent`, strongest first
    ///
    /// The social-norm cue goes after every value preference at least as
    /// strong as it. Agents without the attribute get no social-norm cue.
    fn cues<'a>(&self, agent: &'a ConsumerAgent) -> Vec<Cue<'a>> {
        let preferences = agent.preferences_by_strength();
        let mut cues: Vec<Cue<'a>> = preferences.iter().copied().map(Cue::Value).collect();

        if let TakeTheBestVariant::Schwarz {
            social_norm_attribute,
        } = &self.variant
        {
            if let Some(strength) = agent.attribute(social_norm_attribute) {
                let position = preferences
                    .iter()
                    .position(|p| p.strength < strength)
                    .unwrap_or(preferences.len());
                cues.insert(position, Cue::SocialNorm);
            }
        }
        cues
    }

    fn cue_score(&self, cue: Cue<'_>, product: &str, agent: &ConsumerAgent, ctx: &DecisionContext<'_>) -> Result<f64, DecisionError> {
        match cue {
            Cue::Value(preference) => {
                let (entry, _) = ctx.product_with_group(product)?;
                Ok(cue_utility(
                    self.utility.as_ref(),
                    agent,
                    preference,
                    entry,
                    ctx.market(),
                ))
            }
            Cue::SocialNorm => Ok(ctx.neighbor_adoptions(agent, product) as f64),
        }
    }

    /// Keep the candidates within `TOLERANCE` of the best score
    fn narrow<F>(survivors: Vec<String>, mut score: F) -> Result<Vec<String>, DecisionError>
    where
        F: FnMut(&str) -> Result<f64, DecisionError>,
    {
        let mut scored = Vec::with_capacity(survivors.len());
        for product in survivors {
            let s = score(&product)?;
            scored.push((product, s));
        }
        let best = scored
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        Ok(scored
            .into_iter()
            .filter(|(_, s)| best - *s <= TOLERANCE)
            .map(|(product, _)| product)
            .collect())
    }

    /// Designated standard product among the survivors, if any
    fn standard_product(survivors: &[String], ctx: &DecisionContext<'_>) -> Option<String> {
        survivors
            .iter()
            .filter_map(|p| ctx.market().group_of(p))
            .filter_map(|g| g.standard_product.as_ref())
            .find(|standard| survivors.contains(standard))
            .cloned()
    }
}

impl DecisionProcess for TakeTheBestDecision {
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
        let mut survivors = candidates.to_vec();

        for cue in self.cues(agent) {
            if survivors.len() == 1 {
                break;
            }
            survivors = Self::narrow(survivors, |p| self.cue_score(cue, p, agent, &*ctx))?;
        }
        if survivors.len() == 1 {
            return Ok(survivors.remove(0));
        }

        survivors = Self::narrow(survivors, |p| Ok(ctx.neighbor_adoptions(agent, p) as f64))?;
        if survivors.len() == 1 {
            trace!(agent = agent.id(), product = %survivors[0], "decided by imitation");
            return Ok(survivors.remove(0));
        }

        if let Some(standard) = Self::standard_product(&survivors, ctx) {
            trace!(agent = agent.id(), product = %standard, "decided by standard product");
            return Ok(standard);
        }

        let index = ctx.rng.index(survivors.len());
        trace!(agent = agent.id(), product = %survivors[index], "decided at random");
        Ok(survivors.swap_remove(index))
    }

    /// Lexicographic comparison: the first cue separating the two decides,
    /// then neighbour adoptions. Full ties are not "better".
    fn is_better_available(
        &self,
        candidate: &str,
        alternatives: &[String],
        agent: &ConsumerAgent,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<bool, DecisionError> {
        let cues = self.cues(agent);
        'alternatives: for alternative in alternatives.iter().filter(|a| a.as_str() != candidate) {
            for cue in &cues {
                let own = self.cue_score(*cue, candidate, agent, ctx)?;
                let other = self.cue_score(*cue, alternative, agent, ctx)?;
                if other - own > TOLERANCE {
                    return Ok(true);
                }
                if own - other > TOLERANCE {
                    continue 'alternatives;
                }
            }
            if ctx.neighbor_adoptions(agent, alternative) > ctx.neighbor_adoptions(agent, candidate) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::TimeManager;
    use crate::decision::utility::ValueMappingUtility;
    use crate::models::agent::AdoptedProduct;
    use crate::models::graph::{AdjacencyGraph, EdgeKind};
    use crate::models::product::{Market, Product, ProductGroup};
    use crate::models::state::SimulationState;
    use crate::rng::RngManager;

    fn state() -> SimulationState {
        let mut market = Market::new();
        market.add_group(
            ProductGroup::new("G")
                .with_mapping("eco", "eco", 1.0)
                .with_mapping("cheap", "price", 1.0),
        );
        market.add_product(Product::new("P1", "G").with_attribute("eco", 0.5).with_attribute("price", 0.1));
        market.add_product(Product::new("P2", "G").with_attribute("eco", 0.5).with_attribute("price", 0.9));
        let mut graph = AdjacencyGraph::new();
        graph.add_edge("A", "N", EdgeKind::Social);
        let mut state = SimulationState::new(TimeManager::new(0.0, 1.0), market, graph);
        let mut neighbor = ConsumerAgent::new("N", "H");
        neighbor.adopt(AdoptedProduct::new("P1", "N", 0.0, 10.0)).unwrap();
        state.add_agent(neighbor);
        state
    }

    fn plain() -> TakeTheBestDecision {
        TakeTheBestDecision::new("TakeTheBest", TakeTheBestVariant::Plain, Arc::new(ValueMappingUtility))
    }

    #[test]
    fn test_second_cue_breaks_first_cue_tie() {
        let state = state();
        let mut rng = RngManager::new(1);
        let mut ctx = DecisionContext::new(0.0, &state, &mut rng);
        let agent = ConsumerAgent::new("A", "H")
            .with_preference("eco", 2.0)
            .with_preference("cheap", 1.0);

        let chosen = plain()
            .choose_product(&["P1".to_string(), "P2".to_string()], &agent, &mut ctx)
            .unwrap();
        assert_eq!(chosen, "P2");
    }

    #[test]
    fn test_imitation_breaks_exhausted_cues() {
        let state = state();
        let mut rng = RngManager::new(1);
        let mut ctx = DecisionContext::new(0.0, &state, &mut rng);
        let agent = ConsumerAgent::new("A", "H").with_preference("eco", 1.0);

        let chosen = plain()
            .choose_product(&["P1".to_string(), "P2".to_string()], &agent, &mut ctx)
            .unwrap();
        assert_eq!(chosen, "P1");
    }

    #[test]
    fn test_schwarz_social_norm_cue_outranks_weaker_values() {
        let state = state();
        let mut rng = RngManager::new(1);
        let mut ctx = DecisionContext::new(0.0, &state, &mut rng);
        let agent = ConsumerAgent::new("A", "H")
            .with_preference("eco", 2.0)
            .with_preference("cheap", 1.0)
            .with_attribute(attribute_keys::SOCIAL_NORM, 1.5);

        let schwarz = TakeTheBestDecision::new(
            "SchwarzTakeTheBest",
            TakeTheBestVariant::schwarz(),
            Arc::new(ValueMappingUtility),
        );
        let chosen = schwarz
            .choose_product(&["P1".to_string(), "P2".to_string()], &agent, &mut ctx)
            .unwrap();
        // eco ties, the neighbour's P1 wins before price is consulted
        assert_eq!(chosen, "P1");
    }

    #[test]
    fn test_better_available_is_lexicographic() {
        let state = state();
        let mut rng = RngManager::new(1);
        let mut ctx = DecisionContext::new(0.0, &state, &mut rng);
        let agent = ConsumerAgent::new("A", "H")
            .with_preference("eco", 2.0)
            .with_preference("cheap", 1.0);
        let all = vec!["P1".to_string(), "P2".to_string()];

        assert!(plain().is_better_available("P1", &all, &agent, &mut ctx).unwrap());
        assert!(!plain().is_better_available("P2", &all, &agent, &mut ctx).unwrap());
    }
}
