//! Need event processing
//!
//! Turns a raised need into an adoption, or hands it back to the agent's
//! need-development scheme when nothing qualifies.
//!
//! A need already satisfied by a held product has no candidates. Otherwise
//! candidates are the products the agent is aware of that are on the
//! market, satisfy the need, are not already held and do not share an
//! exclusivity tag with a held product. They are passed to the decision
//! process sorted by id.

use crate::decision::{ConfigError, DecisionContext};
use crate::models::agent::AdoptedProduct;
use crate::models::history::HistoryEvent;
use crate::orchestrator::context::SimulationContext;
use crate::orchestrator::engine::SimulationError;
use crate::schemes::needs::is_need_satisfied;
use crate::schemes::NeedTrigger;
use std::collections::BTreeSet;
use tracing::debug;

/// What became of a need event
#[derive(Debug, Clone, PartialEq)]
pub enum NeedOutcome {
    /// The agent adopted this product
    Adopted { product: String },
    /// Nothing qualified; the need-development scheme decides what's next
    Deferred,
}

/// Products `agent` may adopt to satisfy `need` at `time`, sorted by id
pub fn candidate_products(ctx: &SimulationContext, agent: &str, need: &str, time: f64) -> Vec<String> {
    let state = &ctx.state;
    let Some(entry) = state.get_agent(agent) else {
        return Vec::new();
    };
    if is_need_satisfied(entry, state, need) {
        return Vec::new();
    }
    let market = state.market();
    let held_tags: BTreeSet<&str> = entry
        .adopted_products()
        .iter()
        .filter_map(|a| market.exclusivity_of(a.product()))
        .collect();

    entry
        .aware_products()
        .filter(|p| market.is_on_market(p, time))
        .filter(|p| market.satisfies(p, need))
        .filter(|p| !entry.has_adopted(p))
        .filter(|p| market.exclusivity_of(p).map_or(true, |tag| !held_tags.contains(tag)))
        .map(str::to_string)
        .collect()
}

/// Name of the decision process responsible for `candidates`
///
/// A product-group override applies only when every candidate's group
/// names the same one; otherwise the agent's consumer group default does.
pub fn responsible_process(ctx: &SimulationContext, agent_group: &str, candidates: &[String]) -> Result<String, SimulationError> {
    let market = ctx.state.market();
    let overrides: BTreeSet<Option<&str>> = candidates
        .iter()
        .map(|p| market.group_of(p).and_then(|g| g.decision_process.as_deref()))
        .collect();
    if overrides.len() == 1 {
        if let Some(Some(name)) = overrides.into_iter().next() {
            return Ok(name.to_string());
        }
    }

    let group = ctx.groups.require(agent_group, "need event")?;
    Ok(group.decision_process.clone())
}

pub fn process_need_event(
    ctx: &mut SimulationContext,
    agent: &str,
    need: &str,
    time: f64,
) -> Result<NeedOutcome, SimulationError> {
    let group = match ctx.state.get_agent_mut(agent) {
        Some(entry) => {
            entry.clear_need_pending(need);
            entry.group().to_string()
        }
        None => return Err(SimulationError::AgentNotFound(agent.to_string())),
    };

    let candidates = candidate_products(ctx, agent, need, time);
    if candidates.is_empty() {
        return defer(ctx, agent, &group, need, time);
    }

    let process_name = responsible_process(ctx, &group, &candidates)?;
    let process = ctx
        .decisions
        .get(&process_name)
        .ok_or_else(|| ConfigError::UnresolvedDecisionProcess {
            name: process_name.clone(),
            referenced_by: format!("agent '{}'", agent),
        })?;

    let chosen = {
        let entry = ctx
            .state
            .get_agent(agent)
            .ok_or_else(|| SimulationError::AgentNotFound(agent.to_string()))?;
        let mut decision_ctx = DecisionContext::new(time, &ctx.state, &mut ctx.rng);
        process.choose_product(&candidates, entry, &mut decision_ctx)?
    };

    let lifetime = ctx
        .state
        .market()
        .product(&chosen)
        .map(|p| p.lifetime.clone())
        .ok_or_else(|| SimulationError::ProductNotFound(chosen.clone()))?
        .sample(&mut ctx.rng);
    let adoption = AdoptedProduct::new(chosen.clone(), agent, time, lifetime);
    let expires_at = adoption.expiration_date();

    ctx.state
        .get_agent_mut(agent)
        .ok_or_else(|| SimulationError::AgentNotFound(agent.to_string()))?
        .adopt(adoption)?;

    debug!(
        agent,
        need,
        product = %chosen,
        process = %process_name,
        candidates = candidates.len(),
        "adopted"
    );
    ctx.history.log(HistoryEvent::Adopted {
        time,
        agent: agent.to_string(),
        product: chosen.clone(),
        decision_process: process_name,
        expires_at,
    });

    Ok(NeedOutcome::Adopted { product: chosen })
}

fn defer(
    ctx: &mut SimulationContext,
    agent: &str,
    group: &str,
    need: &str,
    time: f64,
) -> Result<NeedOutcome, SimulationError> {
    let requests = match (ctx.groups.get(group), ctx.state.get_agent(agent)) {
        (Some(g), Some(entry)) => g.needs.create_need_events(
            entry,
            &ctx.state,
            &NeedTrigger::Unsatisfied {
                need: need.to_string(),
            },
        ),
        _ => Vec::new(),
    };
    for request in requests {
        ctx.schedule_need(agent, &request.need, request.at)?;
    }

    debug!(agent, need, "need deferred");
    ctx.history.log(HistoryEvent::NeedDeferred {
        time,
        agent: agent.to_string(),
        need: need.to_string(),
    });
    Ok(NeedOutcome::Deferred)
}
