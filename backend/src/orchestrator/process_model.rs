//! Process models
//!
//! A process model supplies the per-agent hook of each phase. The engine
//! calls the hooks in phase order for every agent and drains due events
//! after each phase.

use crate::events::EventKind;
use crate::models::history::Phase;
use crate::orchestrator::context::SimulationContext;
use crate::orchestrator::engine::SimulationError;
use crate::schemes::NeedTrigger;
use std::fmt::Debug;

pub trait ProcessModel: Debug {
    fn name(&self) -> &str;

    /// Schedule the agent's outgoing messages
    fn knowledge(&self, ctx: &mut SimulationContext, agent: &str) -> Result<(), SimulationError>;

    /// Schedule need events for the agent
    fn persuasion(&self, ctx: &mut SimulationContext, agent: &str) -> Result<(), SimulationError>;

    fn decision(&self, _ctx: &mut SimulationContext, _agent: &str) -> Result<(), SimulationError> {
        Ok(())
    }

    fn implementation(&self, _ctx: &mut SimulationContext, _agent: &str) -> Result<(), SimulationError> {
        Ok(())
    }

    /// Schedule post-purchase evaluations of held products
    fn confirmation(&self, ctx: &mut SimulationContext, agent: &str) -> Result<(), SimulationError>;

    fn run_phase(&self, phase: Phase, ctx: &mut SimulationContext, agent: &str) -> Result<(), SimulationError> {
        match phase {
            Phase::Knowledge => self.knowledge(ctx, agent),
            Phase::Persuasion => self.persuasion(ctx, agent),
            Phase::Decision => self.decision(ctx, agent),
            Phase::Implementation => self.implementation(ctx, agent),
            Phase::Confirmation => self.confirmation(ctx, agent),
        }
    }
}

/// Rogers' five-step innovation-decision process, driven tick by tick
#[derive(Debug, Clone, Default)]
pub struct RogersFiveStepModel;

impl ProcessModel for RogersFiveStepModel {
    fn name(&self) -> &str {
        "RogersFiveStep"
    }

    fn knowledge(&self, ctx: &mut SimulationContext, agent: &str) -> Result<(), SimulationError> {
        let now = ctx.state.current_time();
        let entry = ctx
            .state
            .get_agent(agent)
            .ok_or_else(|| SimulationError::AgentNotFound(agent.to_string()))?;
        let group = ctx.groups.require(entry.group(), "agent")?;

        let messages = group.communication.create_messages(entry, &ctx.state, &mut ctx.rng);
        for message in messages {
            ctx.schedule(now, EventKind::Communication(message))?;
        }
        Ok(())
    }

    fn persuasion(&self, ctx: &mut SimulationContext, agent: &str) -> Result<(), SimulationError> {
        let entry = ctx
            .state
            .get_agent(agent)
            .ok_or_else(|| SimulationError::AgentNotFound(agent.to_string()))?;
        let group = ctx.groups.require(entry.group(), "agent")?;

        let requests = group
            .needs
            .create_need_events(entry, &ctx.state, &NeedTrigger::Persuasion);
        for request in requests {
            ctx.schedule_need(agent, &request.need, request.at)?;
        }
        Ok(())
    }

    fn confirmation(&self, ctx: &mut SimulationContext, agent: &str) -> Result<(), SimulationError> {
        let now = ctx.state.current_time();
        let entry = ctx
            .state
            .get_agent(agent)
            .ok_or_else(|| SimulationError::AgentNotFound(agent.to_string()))?;
        let market = ctx.state.market();
        let held: Vec<String> = entry
            .adopted_products()
            .iter()
            .filter(|a| {
                market
                    .product(a.product())
                    .is_some_and(|p| !p.is_historically_discontinued())
            })
            .map(|a| a.product().to_string())
            .collect();

        for product in held {
            ctx.schedule(
                now,
                EventKind::PostPurchaseEvaluation {
                    agent: agent.to_string(),
                    product,
                },
            )?;
        }
        Ok(())
    }
}
