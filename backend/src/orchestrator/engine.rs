//! Orchestrator engine - tick loop
//!
//! # Tick Loop
//!
//! ```text
//! 1. Move the scheduler's reference time to the tick's time
//! 2. Expire lapsed adoptions
//! 3. Drain due events
//! 4. For each phase (knowledge, persuasion, decision, implementation,
//!    confirmation):
//!      run the phase hook for every agent in roster order
//!      drain due events
//! 5. Advance time
//! ```
//!
//! Draining processes events scheduled during the drain as well, as long as
//! they are due, so same-time cascades (message → need → adoption) resolve
//! before the next phase.
//!
//! # Failure Semantics
//!
//! A phase hook failing with a domain error stops that agent for the rest of
//! the tick and is recorded; the run goes on. Configuration, scheduling and
//! decision errors abort the run.

use crate::core::time::TimeManager;
use crate::decision::{ConfigError, DecisionConfiguration, DecisionError, UtilityRegistry};
use crate::events::{EventKind, SchedulerError};
use crate::models::agent::{AgentError, ConsumerAgent};
use crate::models::graph::AdjacencyGraph;
use crate::models::history::{History, HistoryEvent, Phase};
use crate::models::product::Market;
use crate::models::state::SimulationState;
use crate::orchestrator::config::SimulationConfig;
use crate::orchestrator::context::SimulationContext;
use crate::orchestrator::process_model::{ProcessModel, RogersFiveStepModel};
use crate::rng::RngManager;
use crate::schemes::{ConsumerGroup, ConsumerGroups};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Simulation error types
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    /// Configuration validation error
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Decision(#[from] DecisionError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Feature the current configuration does not implement
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimulationError {
    /// Whether the error must terminate the run
    ///
    /// Domain errors raised by phase hooks (missing agents or products,
    /// rejected adoptions) and unsupported features are recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SimulationError::AgentNotFound(_)
                | SimulationError::ProductNotFound(_)
                | SimulationError::Agent(_)
                | SimulationError::Unsupported(_)
        )
    }
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    pub tick: usize,

    /// Simulation time the tick processed
    pub time: f64,

    /// Events popped and executed
    pub events_processed: usize,

    pub adoptions: usize,

    pub expirations: usize,

    /// Agents whose phase hooks failed this tick
    pub phase_failures: usize,
}

/// Main simulation orchestrator
#[derive(Debug)]
pub struct Orchestrator {
    ctx: SimulationContext,
    model: Box<dyn ProcessModel>,
    num_ticks: usize,
}

impl Orchestrator {
    /// Build a run from configuration
    ///
    /// Validates the configuration and the decision processes eagerly and
    /// schedules the scripted events.
    ///
    /// # Example
    ///
    /// ```rust
    /// use adoption_simulator_core_rs::{Orchestrator, SimulationConfig};
    ///
    /// let config: SimulationConfig = serde_json::from_str(r#"{
    ///     "num_ticks": 2,
    ///     "decision_processes": {
    ///         "Kiesling": {"rangeEpsilon": 0.0, "utilityFunction": "ValueMapping"}
    ///     },
    ///     "consumer_groups": [{"name": "households", "decision_process": "Kiesling"}],
    ///     "agents": [{"id": "A1", "group": "households"}]
    /// }"#).unwrap();
    ///
    /// let mut orchestrator = Orchestrator::new(config).unwrap();
    /// let results = orchestrator.run().unwrap();
    /// assert_eq!(results.len(), 2);
    /// ```
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let utilities = UtilityRegistry::with_builtins();
        let decisions = DecisionConfiguration::build(&config.decision_processes, &utilities)?;
        decisions.validate_references(
            &config.consumer_group_processes(),
            &config.product_group_processes(),
        )?;

        let mut market = Market::new();
        for group in &config.product_groups {
            market.add_group(group.clone());
        }
        for product in &config.products {
            market.add_product(product.clone());
        }

        let mut graph = AdjacencyGraph::new();
        for edge in &config.edges {
            if edge.undirected {
                graph.add_undirected_edge(&edge.from, &edge.to, edge.kind);
            } else {
                graph.add_edge(edge.from.clone(), edge.to.clone(), edge.kind);
            }
        }

        let time = TimeManager::new(config.start_time, config.tick_length);
        let mut state = SimulationState::new(time, market, graph);
        for ac in &config.agents {
            let mut agent = ConsumerAgent::new(ac.id.clone(), ac.group.clone());
            for pref in &ac.preferences {
                agent = agent.with_preference(pref.value.clone(), pref.strength);
            }
            for (name, value) in &ac.attributes {
                agent.set_attribute(name.clone(), *value);
            }
            for need in &ac.needs {
                agent.add_need(need.clone());
            }
            for product in &ac.aware_of {
                agent.make_aware(product.clone());
            }
            state.add_agent(agent);
        }

        let mut groups = ConsumerGroups::new();
        for gc in &config.consumer_groups {
            groups.insert(ConsumerGroup::new(
                gc.name.clone(),
                gc.decision_process.clone(),
                gc.communication.build(),
                gc.need_development.build(),
            ));
        }

        let mut ctx = SimulationContext::new(state, decisions, groups, RngManager::new(config.rng_seed))
            .with_abort_on_unsupported(config.abort_on_unsupported);
        for scripted in &config.scripted_events {
            ctx.schedule(scripted.at, EventKind::Script(scripted.action.clone()))?;
        }

        info!(
            run_id = %ctx.run_id(),
            agents = ctx.state().num_agents(),
            products = ctx.state().market().num_products(),
            ticks = config.num_ticks,
            "simulation initialized"
        );

        Ok(Self::from_parts(ctx, Box::new(RogersFiveStepModel), config.num_ticks))
    }

    /// Assemble an orchestrator from an existing context and process model
    pub fn from_parts(ctx: SimulationContext, model: Box<dyn ProcessModel>, num_ticks: usize) -> Self {
        Self {
            ctx,
            model,
            num_ticks,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn run_id(&self) -> Uuid {
        self.ctx.run_id()
    }

    pub fn current_tick(&self) -> usize {
        self.ctx.state.current_tick()
    }

    pub fn current_time(&self) -> f64 {
        self.ctx.state.current_time()
    }

    pub fn num_ticks(&self) -> usize {
        self.num_ticks
    }

    pub fn state(&self) -> &SimulationState {
        &self.ctx.state
    }

    pub fn history(&self) -> &History {
        &self.ctx.history
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.ctx
    }

    pub fn model(&self) -> &dyn ProcessModel {
        self.model.as_ref()
    }

    /// Number of events ever scheduled in this run
    pub fn event_count(&self) -> usize {
        self.ctx.scheduler.total_scheduled()
    }

    // ========================================================================
    // Tick loop
    // ========================================================================

    /// Execute one tick
    pub fn tick(&mut self) -> Result<TickResult, SimulationError> {
        let tick = self.ctx.state.current_tick();
        let now = self.ctx.state.current_time();
        let span = info_span!("tick", run_id = %self.ctx.run_id, tick, time = now);
        let _guard = span.enter();

        let adoptions_before = self.ctx.history.events_of_type("Adopted").len();
        self.ctx.scheduler.advance_reference_time(now);

        // STEP 1: EXPIRE
        let expired = self.ctx.state.expire_adoptions(now);
        for adoption in &expired {
            self.ctx.history.log(HistoryEvent::AdoptionExpired {
                time: now,
                agent: adoption.adopter().to_string(),
                product: adoption.product().to_string(),
            });
        }

        // STEP 2: DRAIN
        let mut events_processed = self.ctx.drain_due_events()?;

        // STEP 3: PHASES
        let roster = self.ctx.state.agent_ids();
        let mut failed: BTreeSet<String> = BTreeSet::new();
        for phase in Phase::ALL {
            for agent in &roster {
                if failed.contains(agent) {
                    continue;
                }
                if let Err(e) = self.model.run_phase(phase, &mut self.ctx, agent) {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!(agent = %agent, phase = phase.name(), error = %e, "phase hook failed");
                    self.ctx.history.log(HistoryEvent::PhaseFailed {
                        time: now,
                        agent: agent.clone(),
                        phase,
                        reason: e.to_string(),
                    });
                    failed.insert(agent.clone());
                }
            }
            events_processed += self.ctx.drain_due_events()?;
        }

        let adoptions = self.ctx.history.events_of_type("Adopted").len() - adoptions_before;
        debug!(events_processed, adoptions, expirations = expired.len(), "tick complete");

        self.ctx.state.advance_tick();

        Ok(TickResult {
            tick,
            time: now,
            events_processed,
            adoptions,
            expirations: expired.len(),
            phase_failures: failed.len(),
        })
    }

    /// Run the configured number of ticks
    pub fn run(&mut self) -> Result<Vec<TickResult>, SimulationError> {
        let mut results = Vec::with_capacity(self.num_ticks);
        for _ in 0..self.num_ticks {
            results.push(self.tick()?);
        }
        info!(
            run_id = %self.ctx.run_id,
            ticks = results.len(),
            events = self.event_count(),
            "simulation finished"
        );
        Ok(results)
    }
}
