//! Tests for state snapshots and digests

use adoption_simulator_core_rs::models::graph::AdjacencyGraph;
use adoption_simulator_core_rs::orchestrator::checkpoint::{compute_digest, StateSnapshot};
use adoption_simulator_core_rs::{
    compute_state_digest, AdoptedProduct, ConsumerAgent, Market, Product, ProductGroup, SimulationState,
    TimeManager,
};
use serde_json::json;

fn state() -> SimulationState {
    let mut market = Market::new();
    market.add_group(ProductGroup::new("heaters").satisfying("heat"));
    market.add_product(Product::new("P1", "heaters"));
    market.add_product(Product::new("P2", "heaters"));

    let mut state = SimulationState::new(TimeManager::new(0.0, 1.0), market, AdjacencyGraph::new());
    let mut a = ConsumerAgent::new("A", "households").with_need("heat").aware_of("P1");
    a.adopt(AdoptedProduct::new("P1", "A", 0.0, f64::INFINITY)).unwrap();
    state.add_agent(a);
    state.add_agent(ConsumerAgent::new("B", "households").aware_of("P2"));
    state
}

#[test]
fn test_snapshot_is_json_safe() {
    let snapshot = StateSnapshot::capture(&state());

    assert_eq!(snapshot.agents.len(), 2);
    assert_eq!(snapshot.agents[0].id, "A");
    assert_eq!(snapshot.agents[0].holdings[0].expires_at, None);

    let json = serde_json::to_string(&snapshot).unwrap();
    let back: StateSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn test_digest_is_stable() {
    let digest = compute_state_digest(&state()).unwrap();
    assert_eq!(digest.len(), 64);
    assert_eq!(digest, compute_state_digest(&state()).unwrap());
}

#[test]
fn test_digest_tracks_state_changes() {
    let before = compute_state_digest(&state()).unwrap();

    let mut changed = state();
    changed.discontinue_product("P1", 0.0).unwrap();
    let after = compute_state_digest(&changed).unwrap();

    assert_ne!(before, after);
    let snapshot = StateSnapshot::capture(&changed);
    assert!(snapshot.agents[0].holdings.is_empty());
    assert_eq!(snapshot.discontinued_products.len(), 1);
}

#[test]
fn test_digest_ignores_key_order() {
    let a = json!({"x": 1, "y": {"b": 2, "a": 3}});
    let b: serde_json::Value = serde_json::from_str(r#"{"y": {"a": 3, "b": 2}, "x": 1}"#).unwrap();
    assert_eq!(compute_digest(&a).unwrap(), compute_digest(&b).unwrap());
}
