//! Tier dependency graph.
//!
//! Provides the `TierGraph` type, a directed acyclic graph over tiered
//! technologies and abilities. An edge runs from a lower tier to the next
//! tier of the same line, so every predecessor of a node is a tier that
//! node implies.

use crate::entity_id::EntityId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A DAG of tier implications.
///
/// # Examples
///
/// ```rust
/// use skirmish::graph::TierGraph;
/// use skirmish::EntityId;
///
/// let mut graph = TierGraph::new();
/// let t1 = EntityId::new("melee-damage-1");
/// let t2 = EntityId::new("melee-damage-2");
/// let t3 = EntityId::new("melee-damage-3");
///
/// graph.add_edge(t1.clone(), t2.clone());
/// graph.add_edge(t2.clone(), t3.clone());
///
/// assert_eq!(graph.implied_tiers(&t3), vec![t1, t2]);
/// ```
#[derive(Debug, Clone)]
pub struct TierGraph {
    graph: DiGraph<EntityId, ()>,
    node_map: HashMap<EntityId, NodeIndex>,
}

impl TierGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a node if it doesn't exist, returning its index.
    pub fn add_node(&mut self, id: EntityId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&id) {
            idx
        } else {
            let idx = self.graph.add_node(id.clone());
            self.node_map.insert(id, idx);
            idx
        }
    }

    /// `higher` implies `lower`. Both nodes are added if missing.
    pub fn add_edge(&mut self, lower: EntityId, higher: EntityId) {
        let lower_idx = self.add_node(lower);
        let higher_idx = self.add_node(higher);
        self.graph.update_edge(lower_idx, higher_idx, ());
    }

    pub fn contains_node(&self, id: &EntityId) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Tiers implied by `id`, lowest first, excluding `id` itself.
    ///
    /// Walks incoming edges depth first and emits each tier after every
    /// tier it implies. Unknown ids imply nothing.
    pub fn implied_tiers(&self, id: &EntityId) -> Vec<EntityId> {
        let start = match self.node_map.get(id) {
            Some(&idx) => idx,
            None => return Vec::new(),
        };

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.collect_lower(start, &mut visited, &mut order);
        order.pop();
        order
    }

    fn collect_lower(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        order: &mut Vec<EntityId>,
    ) {
        if !visited.insert(node) {
            return;
        }
        let mut lower: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        lower.sort_unstable();
        for lower_idx in lower {
            self.collect_lower(lower_idx, visited, order);
        }
        order.push(self.graph[node].clone());
    }
}

impl Default for TierGraph {
    fn default() -> Self {
        Self::new()
    }
}
