//! Event execution
//!
//! Every handler re-validates what its event refers to. State may have
//! changed since scheduling (a product discontinued, an adoption expired),
//! in which case the event is a logged no-op rather than an error.

use crate::decision::{ConfigError, DecisionContext};
use crate::events::need::process_need_event;
use crate::events::types::{Event, EventKind, ScriptAction};
use crate::models::graph::SocialGraph;
use crate::models::history::HistoryEvent;
use crate::models::message::{Message, MessageContent, MessageEffect};
use crate::orchestrator::context::SimulationContext;
use crate::orchestrator::engine::SimulationError;
use tracing::{debug, trace};

/// Execute one popped event at the current simulation time
pub fn process_event(ctx: &mut SimulationContext, event: Event) -> Result<(), SimulationError> {
    let now = ctx.state.current_time();
    trace!(event_id = %event.id(), kind = event.kind().name(), time = now, "processing event");

    match event.into_kind() {
        EventKind::Communication(message) => deliver_message(ctx, message, now),
        EventKind::Need { agent, need } => {
            if ctx.state.get_agent(&agent).is_none() {
                skip_stale(ctx, now, format!("need '{}' for missing agent {}", need, agent));
                return Ok(());
            }
            process_need_event(ctx, &agent, &need, now).map(|_| ())
        }
        EventKind::PostPurchaseEvaluation { agent, product } => evaluate_adoption(ctx, &agent, &product, now),
        EventKind::Script(action) => apply_script(ctx, action, now),
    }
}

fn skip_stale(ctx: &mut SimulationContext, time: f64, reason: String) {
    trace!(reason = %reason, "stale event skipped");
    ctx.history.log(HistoryEvent::StaleEventSkipped { time, reason });
}

fn deliver_message(ctx: &mut SimulationContext, message: Message, now: f64) -> Result<(), SimulationError> {
    match message.process(&mut ctx.state, now) {
        MessageEffect::Ignored { reason } => {
            trace!(sender = %message.sender, receiver = %message.receiver, reason = %reason, "message ignored");
            return Ok(());
        }
        MessageEffect::NeedAwakened { need } => {
            ctx.schedule_need(&message.receiver, &need, now)?;
        }
        MessageEffect::BecameAware { .. } | MessageEffect::Perceived { .. } => {}
    }
    ctx.history.log(HistoryEvent::MessageDelivered {
        time: now,
        sender: message.sender,
        receiver: message.receiver,
    });
    Ok(())
}

/// Post-purchase evaluation
///
/// Compares the held product against aware, on-market products satisfying
/// at least one of the same needs. A satisfied adopter recommends the
/// product once per adoption to a random communication neighbour.
fn evaluate_adoption(ctx: &mut SimulationContext, agent: &str, product: &str, now: f64) -> Result<(), SimulationError> {
    let Some(entry) = ctx.state.get_agent(agent) else {
        skip_stale(ctx, now, format!("evaluation for missing agent {}", agent));
        return Ok(());
    };
    let market = ctx.state.market();
    if !entry.has_adopted(product) || !market.is_on_market(product, now) {
        skip_stale(ctx, now, format!("{} no longer holds an on-market {}", agent, product));
        return Ok(());
    }
    let Some(group) = market.group_of(product) else {
        return Err(SimulationError::ProductNotFound(product.to_string()));
    };

    let alternatives: Vec<String> = entry
        .aware_products()
        .filter(|p| *p != product)
        .filter(|p| market.is_on_market(p, now))
        .filter(|p| group.satisfied_needs.iter().any(|need| market.satisfies(p, need)))
        .map(str::to_string)
        .collect();

    let process_name = match &group.decision_process {
        Some(name) => name.clone(),
        None => ctx.groups.require(entry.group(), "post-purchase evaluation")?.decision_process.clone(),
    };
    let process = ctx
        .decisions
        .get(&process_name)
        .ok_or_else(|| ConfigError::UnresolvedDecisionProcess {
            name: process_name.clone(),
            referenced_by: "post-purchase evaluation".to_string(),
        })?;

    let better_available = if alternatives.is_empty() {
        false
    } else {
        let mut decision_ctx = DecisionContext::new(now, &ctx.state, &mut ctx.rng);
        process.is_better_available(product, &alternatives, entry, &mut decision_ctx)?
    };

    debug!(agent, product, better_available, "post-purchase evaluation");
    ctx.history.log(HistoryEvent::PostPurchaseEvaluated {
        time: now,
        agent: agent.to_string(),
        product: product.to_string(),
        better_available,
    });

    if better_available {
        return Ok(());
    }
    let partners: Vec<String> = ctx
        .state
        .graph()
        .communication_neighbors(agent)
        .into_iter()
        .map(str::to_string)
        .collect();
    if partners.is_empty() {
        return Ok(());
    }
    let newly_recommended = ctx
        .state
        .get_agent_mut(agent)
        .is_some_and(|a| a.mark_recommended(product));
    if newly_recommended {
        let partner = partners[ctx.rng.index(partners.len())].clone();
        let message = Message::new(
            agent,
            partner,
            MessageContent::ProductAwareness {
                product: product.to_string(),
            },
        );
        ctx.schedule(now, EventKind::Communication(message))?;
    }
    Ok(())
}

fn apply_script(ctx: &mut SimulationContext, action: ScriptAction, now: f64) -> Result<(), SimulationError> {
    match action {
        ScriptAction::IntroduceProduct { product } => {
            if ctx.state.introduce_product(&product, now) {
                debug!(product = %product, "product introduced");
                ctx.history.log(HistoryEvent::ProductIntroduced { time: now, product });
            } else {
                skip_stale(ctx, now, format!("cannot introduce {}", product));
            }
        }
        ScriptAction::DiscontinueProduct { product } => match ctx.state.discontinue_product(&product, now) {
            Some(wiped) => {
                debug!(product = %product, wiped = wiped.len(), "product discontinued");
                ctx.history.log(HistoryEvent::ProductDiscontinued {
                    time: now,
                    product,
                    wiped_adoptions: wiped.len(),
                });
            }
            None => skip_stale(ctx, now, format!("cannot discontinue unknown product {}", product)),
        },
        ScriptAction::SeedAwareness { agent, product } => {
            let on_market = ctx.state.market().is_on_market(&product, now);
            match ctx.state.get_agent_mut(&agent) {
                Some(entry) if on_market => {
                    entry.make_aware(product);
                }
                _ => skip_stale(ctx, now, format!("cannot seed {} with {}", agent, product)),
            }
        }
        ScriptAction::RaiseNeed { agent, need } => match ctx.state.get_agent_mut(&agent) {
            Some(entry) => {
                entry.add_need(need.clone());
                ctx.schedule_need(&agent, &need, now)?;
            }
            None => skip_stale(ctx, now, format!("cannot raise need for missing agent {}", agent)),
        },
        ScriptAction::Custom { name } => {
            return Err(SimulationError::Unsupported(format!("script action '{}'", name)));
        }
    }
    Ok(())
}
