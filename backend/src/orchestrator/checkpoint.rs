//! State snapshots and digests
//!
//! A snapshot captures what a run has produced so far: who knows and holds
//! what, and which products left the market. Two runs with the same seed and
//! configuration must produce the same digest after the same number of ticks.
//!
//! # Critical Invariants
//!
//! - **Canonical form**: agents, awareness and holdings are sorted; object
//!   keys are sorted before hashing
//! - **JSON-safe**: unbounded expiration dates are stored as `None`

use crate::models::state::SimulationState;
use crate::orchestrator::engine::SimulationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Run-state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub current_tick: usize,
    pub current_time: f64,
    pub agents: Vec<AgentSnapshot>,
    pub discontinued_products: Vec<DiscontinuedProduct>,
}

/// Agent state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub group: String,
    pub aware_of: Vec<String>,
    pub holdings: Vec<HoldingSnapshot>,
    pub needs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSnapshot {
    pub product: String,
    pub adoption_time: f64,
    /// None when the adoption never expires
    pub expires_at: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscontinuedProduct {
    pub product: String,
    pub at: f64,
}

impl StateSnapshot {
    pub fn capture(state: &SimulationState) -> Self {
        let agents = state
            .agents()
            .map(|agent| {
                let mut holdings: Vec<HoldingSnapshot> = agent
                    .adopted_products()
                    .iter()
                    .map(|a| HoldingSnapshot {
                        product: a.product().to_string(),
                        adoption_time: a.adoption_time(),
                        expires_at: Some(a.expiration_date()).filter(|t| t.is_finite()),
                    })
                    .collect();
                holdings.sort_by(|a, b| a.product.cmp(&b.product));

                AgentSnapshot {
                    id: agent.id().to_string(),
                    group: agent.group().to_string(),
                    aware_of: agent.aware_products().map(str::to_string).collect(),
                    holdings,
                    needs: agent.needs().iter().cloned().collect(),
                }
            })
            .collect();

        let discontinued_products = state
            .market()
            .products()
            .filter_map(|p| {
                p.discontinued_at.map(|at| DiscontinuedProduct {
                    product: p.id.clone(),
                    at,
                })
            })
            .collect();

        Self {
            current_tick: state.current_tick(),
            current_time: state.current_time(),
            agents,
            discontinued_products,
        }
    }
}

/// SHA-256 over the canonical JSON form of any serializable value
pub fn compute_digest<T: Serialize>(value: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(value)
        .map_err(|e| SimulationError::Serialization(format!("Snapshot serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| SimulationError::Serialization(format!("Snapshot serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest of the run state
pub fn compute_state_digest(state: &SimulationState) -> Result<String, SimulationError> {
    compute_digest(&StateSnapshot::capture(state))
}
