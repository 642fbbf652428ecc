//! Risk dependency graph.
//!
//! Nodes carry dense integer ids starting at 1. Every link must reference
//! existing node ids; [`DependencyGraph::from_parts`] enforces this by
//! dropping dangling links and suppressing duplicates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A single risk in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskNode {
    pub id: u32,
    pub name: String,
    pub description: String,
}

/// A directed relationship between two risk nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RiskLink {
    pub source: u32,
    pub target: u32,
}

impl RiskLink {
    pub fn new(source: u32, target: u32) -> Self {
        Self { source, target }
    }
}

/// Node/edge graph describing inferred relationships between risks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<RiskNode>,
    pub links: Vec<RiskLink>,
}

impl DependencyGraph {
    /// Build a graph, keeping only links whose endpoints exist in `nodes`.
    ///
    /// Duplicate links are dropped; first-seen order is preserved.
    pub fn from_parts(nodes: Vec<RiskNode>, links: impl IntoIterator<Item = RiskLink>) -> Self {
        let ids: HashSet<u32> = nodes.iter().map(|n| n.id).collect();
        let mut seen = HashSet::new();
        let links = links
            .into_iter()
            .filter(|l| ids.contains(&l.source) && ids.contains(&l.target))
            .filter(|l| seen.insert(*l))
            .collect();
        Self { nodes, links }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// `true` when every link endpoint resolves to a node.
    pub fn is_referentially_sound(&self) -> bool {
        let ids: HashSet<u32> = self.nodes.iter().map(|n| n.id).collect();
        self.links
            .iter()
            .all(|l| ids.contains(&l.source) && ids.contains(&l.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32) -> RiskNode {
        RiskNode {
            id,
            name: format!("risk-{id}"),
            description: String::new(),
        }
    }

    #[test]
    fn test_from_parts_drops_dangling_and_duplicate_links() {
        let graph = DependencyGraph::from_parts(
            vec![node(1), node(2), node(3)],
            vec![
                RiskLink::new(1, 2),
                RiskLink::new(2, 9),
                RiskLink::new(1, 2),
                RiskLink::new(3, 1),
                RiskLink::new(0, 3),
            ],
        );

        assert_eq!(graph.links, vec![RiskLink::new(1, 2), RiskLink::new(3, 1)]);
        assert!(graph.is_referentially_sound());
    }

    #[test]
    fn test_default_graph_is_empty() {
        let graph = DependencyGraph::default();
        assert!(graph.is_empty());
        assert!(graph.is_referentially_sound());
    }

    #[test]
    fn test_self_loops_are_kept() {
        let graph = DependencyGraph::from_parts(vec![node(1)], vec![RiskLink::new(1, 1)]);
        assert_eq!(graph.links.len(), 1);
    }
}
