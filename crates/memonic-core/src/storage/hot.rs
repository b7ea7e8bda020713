//! The hot tier: full-precision records held in RAM, backed by a
//! [`DashMap`] so readers don't contend with each other the way a single
//! `RwLock<HashMap<_>>` would under concurrent recall traffic.

use dashmap::DashMap;

use crate::id::NodeId;
use crate::memory::Node;

#[derive(Default)]
pub struct HotTier {
    nodes: DashMap<NodeId, Node>,
}

impl HotTier {
    pub fn new() -> Self {
        HotTier {
            nodes: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    pub fn get(&self, id: &NodeId) -> Option<Node> {
        self.nodes.get(id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn remove(&self, id: &NodeId) -> Option<Node> {
        self.nodes.remove(id).map(|(_, n)| n)
    }

    pub fn with_mut<R>(&self, id: &NodeId, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        self.nodes.get_mut(id).map(|mut r| f(r.value_mut()))
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|r| *r.key()).collect()
    }

    pub fn all(&self) -> Vec<Node> {
        self.nodes.iter().map(|r| r.value().clone()).collect()
    }

    /// Candidates for demotion, oldest-`tau_accessed`-first, intended to be
    /// further sorted by the caller using lowest-priority-first policy
    /// (older + lower-confidence + lower-epsilon).
    pub fn oldest_first(&self, older_than_ms: i64) -> Vec<Node> {
        let mut out: Vec<Node> = self
            .nodes
            .iter()
            .filter(|r| r.value().tau_accessed < older_than_ms)
            .map(|r| r.value().clone())
            .collect();
        out.sort_by_key(|n| n.tau_accessed);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::memory::NodeKind;

    fn sample_node() -> Node {
        Node::new(
            NodeKind::Episode,
            vec![],
            None,
            None,
            HashSet::new(),
            None,
            8,
        )
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let tier = HotTier::new();
        let node = sample_node();
        let id = node.id;
        tier.insert(node);
        assert!(tier.contains(&id));
        assert_eq!(tier.get(&id).unwrap().id, id);
    }

    #[test]
    fn remove_drops_node() {
        let tier = HotTier::new();
        let node = sample_node();
        let id = node.id;
        tier.insert(node);
        assert!(tier.remove(&id).is_some());
        assert!(!tier.contains(&id));
    }

    #[test]
    fn with_mut_applies_in_place() {
        let tier = HotTier::new();
        let node = sample_node();
        let id = node.id;
        tier.insert(node);
        tier.with_mut(&id, |n| n.add_tag("x".into()));
        assert!(tier.get(&id).unwrap().tags.contains("x"));
    }
}
