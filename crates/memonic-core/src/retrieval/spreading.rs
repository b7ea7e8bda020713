//! Spreading activation: propagate a top-seed's relevance outward along
//! edges, decaying per hop, bounded in depth. This is what lets a node
//! connected to (but not textually/semantically close to) a strong match
//! still surface in results.

use std::collections::HashMap;

use crate::id::NodeId;
use crate::memory::Node;

/// How many of the top-ranked dense/sparse candidates seed the spread.
pub const SEED_COUNT: usize = 5;
/// Hops beyond which activation is not propagated further.
pub const MAX_DEPTH: u32 = 2;
/// Multiplicative decay applied per hop.
pub const HOP_DECAY: f32 = 0.5;

/// `node_lookup` is expected to be fast (hot-tier cache or equivalent); it's
/// called once per edge traversed, bounded by `MAX_DEPTH` hops from each
/// seed.
pub fn spread_activation(
    seeds: &[(NodeId, f32)],
    node_lookup: impl Fn(&NodeId) -> Option<Node>,
) -> HashMap<NodeId, f32> {
    let mut activation: HashMap<NodeId, f32> = HashMap::new();
    let mut frontier: Vec<(NodeId, f32, u32)> = seeds
        .iter()
        .take(SEED_COUNT)
        .map(|(id, rel)| (*id, *rel, 0))
        .collect();

    while let Some((id, energy, depth)) = frontier.pop() {
        if depth >= MAX_DEPTH {
            continue;
        }
        let Some(node) = node_lookup(&id) else {
            continue;
        };
        for edge in &node.edges {
            let contribution = energy * edge.weight * HOP_DECAY;
            if contribution <= f32::EPSILON {
                continue;
            }
            *activation.entry(edge.target).or_insert(0.0) += contribution;
            frontier.push((edge.target, contribution, depth + 1));
        }
    }

    activation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{EdgeType, NodeKind};
    use std::collections::HashSet;

    fn node_with_edge(to: NodeId, weight: f32) -> Node {
        let mut n = Node::new(NodeKind::Episode, vec![], None, None, HashSet::new(), None, 4);
        n.edges.push(crate::memory::Edge::new(to, EdgeType::Related, weight));
        n
    }

    #[test]
    fn activation_decays_per_hop() {
        let seed = NodeId::new();
        let hop1 = NodeId::new();
        let hop2 = NodeId::new();

        let seed_node = node_with_edge(hop1, 1.0);
        let hop1_node = node_with_edge(hop2, 1.0);

        let lookup = move |id: &NodeId| {
            if *id == seed {
                Some(seed_node.clone())
            } else if *id == hop1 {
                Some(hop1_node.clone())
            } else {
                None
            }
        };

        let activation = spread_activation(&[(seed, 1.0)], lookup);
        assert!((activation[&hop1] - HOP_DECAY).abs() < 1e-6);
        assert!((activation[&hop2] - HOP_DECAY * HOP_DECAY).abs() < 1e-6);
    }

    #[test]
    fn depth_beyond_max_is_not_propagated() {
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        let d = NodeId::new();
        let a_node = node_with_edge(b, 1.0);
        let b_node = node_with_edge(c, 1.0);
        let c_node = node_with_edge(d, 1.0);
        let lookup = move |id: &NodeId| {
            if *id == a {
                Some(a_node.clone())
            } else if *id == b {
                Some(b_node.clone())
            } else if *id == c {
                Some(c_node.clone())
            } else {
                None
            }
        };
        let activation = spread_activation(&[(a, 1.0)], lookup);
        assert!(!activation.contains_key(&d));
    }
}
