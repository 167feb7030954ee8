//! Per-run simulation context
//!
//! Everything one run owns lives here: state, scheduler, random stream,
//! decision processes, consumer groups and history. Nothing is shared across
//! runs, so several runs can execute side by side in one process.

use crate::decision::DecisionConfiguration;
use crate::events::handler::process_event;
use crate::events::{DiscreteEventScheduler, EventId, EventKind};
use crate::models::history::{History, HistoryEvent};
use crate::models::state::SimulationState;
use crate::orchestrator::engine::SimulationError;
use crate::rng::RngManager;
use crate::schemes::ConsumerGroups;
use tracing::{trace, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct SimulationContext {
    pub(crate) run_id: Uuid,
    pub(crate) state: SimulationState,
    pub(crate) scheduler: DiscreteEventScheduler,
    pub(crate) rng: RngManager,
    pub(crate) decisions: DecisionConfiguration,
    pub(crate) groups: ConsumerGroups,
    pub(crate) history: History,
    pub(crate) abort_on_unsupported: bool,
}

impl SimulationContext {
    pub fn new(
        state: SimulationState,
        decisions: DecisionConfiguration,
        groups: ConsumerGroups,
        rng: RngManager,
    ) -> Self {
        let scheduler = DiscreteEventScheduler::new(state.current_time());
        Self {
            run_id: Uuid::new_v4(),
            state,
            scheduler,
            rng,
            decisions,
            groups,
            history: History::new(),
            abort_on_unsupported: false,
        }
    }

    /// Make unsupported events abort the run instead of being skipped
    pub fn with_abort_on_unsupported(mut self, abort: bool) -> Self {
        self.abort_on_unsupported = abort;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn scheduler(&self) -> &DiscreteEventScheduler {
        &self.scheduler
    }

    pub fn rng(&self) -> &RngManager {
        &self.rng
    }

    pub fn decisions(&self) -> &DecisionConfiguration {
        &self.decisions
    }

    pub fn groups(&self) -> &ConsumerGroups {
        &self.groups
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time()
    }

    /// Create and schedule an event
    pub fn schedule(&mut self, at: f64, kind: EventKind) -> Result<EventId, SimulationError> {
        Ok(self.scheduler.schedule(at, kind)?)
    }

    /// Schedule a need event unless one is already pending for the need
    ///
    /// Returns whether an event was scheduled. Unknown agents schedule
    /// nothing.
    pub fn schedule_need(&mut self, agent: &str, need: &str, at: f64) -> Result<bool, SimulationError> {
        let marked = match self.state.get_agent_mut(agent) {
            Some(entry) => entry.mark_need_pending(need),
            None => false,
        };
        if !marked {
            return Ok(false);
        }
        self.schedule(
            at,
            EventKind::Need {
                agent: agent.to_string(),
                need: need.to_string(),
            },
        )?;
        Ok(true)
    }

    /// Process every event due at the current time
    ///
    /// Events scheduled while draining are processed too when they are due,
    /// so same-time cascades resolve completely. Returns the number of
    /// events processed; draining with nothing due changes nothing.
    pub fn drain_due_events(&mut self) -> Result<usize, SimulationError> {
        let now = self.state.current_time();
        let mut processed = 0;
        while let Some(event) = self.scheduler.pop_due(now) {
            processed += 1;
            let id = event.id();
            match process_event(self, event) {
                Ok(()) => {}
                Err(SimulationError::Unsupported(reason)) if !self.abort_on_unsupported => {
                    warn!(event_id = %id, reason = %reason, "skipping unsupported event");
                    self.history.log(HistoryEvent::UnsupportedSkipped { time: now, reason });
                }
                Err(e) => return Err(e),
            }
        }
        if processed > 0 {
            trace!(time = now, processed, "drained events");
        }
        Ok(processed)
    }
}
