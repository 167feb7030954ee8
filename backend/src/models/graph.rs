//! Social graph contract and an adjacency-list implementation
//!
//! Topology generation is out of scope: graphs are assembled edge by edge
//! from configuration or tests. Neighbour queries return ids in sorted order
//! so imitation counts and partner selection are reproducible.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of relation an edge represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Social tie (counted for imitation)
    Social,
    /// Communication channel (used for messages, also counted for imitation)
    Communication,
}

/// Neighbourhood queries the kernel needs from a social graph
pub trait SocialGraph {
    /// All neighbours regardless of edge kind, sorted by id
    fn neighbors(&self, agent: &str) -> Vec<&str>;

    /// Neighbours reachable over communication edges, sorted by id
    fn communication_neighbors(&self, agent: &str) -> Vec<&str>;
}

/// Directed adjacency-list graph keyed by agent id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    edges: BTreeMap<String, BTreeMap<String, BTreeSet<EdgeKind>>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directed edge; adding the same edge twice is a no-op
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) {
        self.edges
            .entry(from.into())
            .or_default()
            .entry(to.into())
            .or_default()
            .insert(kind);
    }

    /// Add the edge in both directions
    pub fn add_undirected_edge(&mut self, a: &str, b: &str, kind: EdgeKind) {
        self.add_edge(a, b, kind);
        self.add_edge(b, a, kind);
    }

    pub fn has_edge(&self, from: &str, to: &str, kind: EdgeKind) -> bool {
        self.edges
            .get(from)
            .and_then(|targets| targets.get(to))
            .is_some_and(|kinds| kinds.contains(&kind))
    }

    pub fn num_edges(&self) -> usize {
        self.edges
            .values()
            .flat_map(|targets| targets.values())
            .map(BTreeSet::len)
            .sum()
    }
}

impl SocialGraph for AdjacencyGraph {
    fn neighbors(&self, agent: &str) -> Vec<&str> {
        self.edges
            .get(agent)
            .map(|targets| targets.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn communication_neighbors(&self, agent: &str) -> Vec<&str> {
        self.edges
            .get(agent)
            .map(|targets| {
                targets
                    .iter()
                    .filter(|(_, kinds)| kinds.contains(&EdgeKind::Communication))
                    .map(|(id, _)| id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_queries() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge("A", "C", EdgeKind::Social);
        graph.add_edge("A", "B", EdgeKind::Communication);
        graph.add_edge("A", "B", EdgeKind::Social);

        assert_eq!(graph.neighbors("A"), vec!["B", "C"]);
        assert_eq!(graph.communication_neighbors("A"), vec!["B"]);
        assert!(graph.neighbors("B").is_empty());
        assert_eq!(graph.num_edges(), 3);
    }

    #[test]
    fn test_undirected_edge() {
        let mut graph = AdjacencyGraph::new();
        graph.add_undirected_edge("A", "B", EdgeKind::Communication);
        assert!(graph.has_edge("A", "B", EdgeKind::Communication));
        assert!(graph.has_edge("B", "A", EdgeKind::Communication));
        assert!(!graph.has_edge("B", "A", EdgeKind::Social));
    }
}
