//! Need-development schemes
//!
//! A need-development scheme decides when an agent's needs are raised. It is
//! asked twice: in the persuasion phase, and when a raised need found no
//! product to adopt.

use crate::models::agent::ConsumerAgent;
use crate::models::state::SimulationState;
use std::fmt::Debug;

/// Why the scheme is being asked
#[derive(Debug, Clone, PartialEq)]
pub enum NeedTrigger {
    /// Regular persuasion phase pass
    Persuasion,
    /// A need event found no qualifying product
    Unsatisfied { need: String },
}

/// A need to raise at a given time
#[derive(Debug, Clone, PartialEq)]
pub struct NeedRequest {
    pub need: String,
    pub at: f64,
}

pub trait NeedDevelopmentScheme: Debug {
    fn create_need_events(&self, agent: &ConsumerAgent, state: &SimulationState, trigger: &NeedTrigger) -> Vec<NeedRequest>;
}

/// Whether `agent` holds a product satisfying `need`
pub fn is_need_satisfied(agent: &ConsumerAgent, state: &SimulationState, need: &str) -> bool {
    agent
        .adopted_products()
        .iter()
        .any(|a| state.market().satisfies(a.product(), need))
}

/// Raise every unsatisfied need right away
///
/// Needs that already have an event pending are skipped. An unsatisfied need
/// is raised again after `retry_delay`, or dropped until the next persuasion
/// phase when no delay is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActiveNeedsScheme {
    pub retry_delay: Option<f64>,
}

impl ActiveNeedsScheme {
    pub fn new(retry_delay: Option<f64>) -> Self {
        Self { retry_delay }
    }
}

impl NeedDevelopmentScheme for ActiveNeedsScheme {
    fn create_need_events(&self, agent: &ConsumerAgent, state: &SimulationState, trigger: &NeedTrigger) -> Vec<NeedRequest> {
        let now = state.current_time();
        match trigger {
            NeedTrigger::Persuasion => agent
                .needs()
                .iter()
                .filter(|need| !agent.is_need_pending(need))
                .filter(|need| !is_need_satisfied(agent, state, need))
                .map(|need| NeedRequest {
                    need: need.clone(),
                    at: now,
                })
                .collect(),
            NeedTrigger::Unsatisfied { need } if is_need_satisfied(agent, state, need) => Vec::new(),
            NeedTrigger::Unsatisfied { need } => match self.retry_delay {
                Some(delay) if delay > 0.0 => vec![NeedRequest {
                    need: need.clone(),
                    at: now + delay,
                }],
                _ => Vec::new(),
            },
        }
    }
}

/// Never raises needs on its own
#[derive(Debug, Clone, Default)]
pub struct DormantNeedsScheme;

impl NeedDevelopmentScheme for DormantNeedsScheme {
    fn create_need_events(&self, _agent: &ConsumerAgent, _state: &SimulationState, _trigger: &NeedTrigger) -> Vec<NeedRequest> {
        Vec::new()
    }
}
