//! Reverse-edge index: for each node id, the set of incoming
//! `(source, type, weight)` triples. The forward direction already lives on
//! each `Node`'s own `edges` list; this is what lets retrieval and `forget`
//! walk backward without a full table scan.

use std::collections::HashMap;

use crate::id::NodeId;
use crate::memory::EdgeType;

#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEdge {
    pub source: NodeId,
    pub edge_type: EdgeType,
    pub weight: f32,
}

#[derive(Default)]
pub struct ReverseEdgeIndex {
    incoming: HashMap<NodeId, Vec<IncomingEdge>>,
}

impl ReverseEdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: NodeId, target: NodeId, edge_type: EdgeType, weight: f32) {
        let entry = self.incoming.entry(target).or_default();
        if let Some(existing) = entry.iter_mut().find(|e| e.source == source && e.edge_type == edge_type) {
            existing.weight = weight;
        } else {
            entry.push(IncomingEdge { source, edge_type, weight });
        }
    }

    pub fn remove_edge(&mut self, source: &NodeId, target: &NodeId, edge_type: EdgeType) {
        if let Some(entry) = self.incoming.get_mut(target) {
            entry.retain(|e| !(e.source == *source && e.edge_type == edge_type));
        }
    }

    /// Drops every edge pointing at `target` (used when a node is forgotten).
    pub fn remove_target(&mut self, target: &NodeId) -> Vec<IncomingEdge> {
        self.incoming.remove(target).unwrap_or_default()
    }

    /// Drops every edge sourced from `source`, across all targets (used when
    /// the source node itself is forgotten, since its own edge list dies
    /// with it).
    pub fn remove_source(&mut self, source: &NodeId) {
        for entry in self.incoming.values_mut() {
            entry.retain(|e| e.source != *source);
        }
    }

    pub fn incoming(&self, target: &NodeId) -> &[IncomingEdge] {
        self.incoming.get(target).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn incoming_count(&self, target: &NodeId) -> usize {
        self.incoming.get(target).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_query_incoming() {
        let mut idx = ReverseEdgeIndex::new();
        let a = NodeId::new();
        let b = NodeId::new();
        idx.add(a, b, EdgeType::Causes, 0.8);
        let incoming = idx.incoming(&b);
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].source, a);
    }

    #[test]
    fn duplicate_add_updates_weight_not_count() {
        let mut idx = ReverseEdgeIndex::new();
        let a = NodeId::new();
        let b = NodeId::new();
        idx.add(a, b, EdgeType::Related, 0.5);
        idx.add(a, b, EdgeType::Related, 0.9);
        assert_eq!(idx.incoming_count(&b), 1);
        assert_eq!(idx.incoming(&b)[0].weight, 0.9);
    }

    #[test]
    fn remove_target_clears_its_incoming_set() {
        let mut idx = ReverseEdgeIndex::new();
        let a = NodeId::new();
        let b = NodeId::new();
        idx.add(a, b, EdgeType::Mentions, 1.0);
        let removed = idx.remove_target(&b);
        assert_eq!(removed.len(), 1);
        assert!(idx.incoming(&b).is_empty());
    }

    #[test]
    fn remove_source_strips_edges_from_all_targets() {
        let mut idx = ReverseEdgeIndex::new();
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        idx.add(a, b, EdgeType::Related, 0.5);
        idx.add(a, c, EdgeType::Related, 0.5);
        idx.remove_source(&a);
        assert!(idx.incoming(&b).is_empty());
        assert!(idx.incoming(&c).is_empty());
    }
}
