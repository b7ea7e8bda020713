//! Attractor dynamics: nodes with high effective confidence and high graph
//! degree act as semantic "basins" that pull nearby embeddings toward them
//! over time, the way a frequently-reinforced belief gradually absorbs the
//! memories that support it.

use crate::id::NodeId;
use crate::index::Indices;
use crate::memory::Node;
use crate::storage::TieredStore;
use crate::vector::Vector;

use crate::error::Result;

/// An attractor needs effective confidence at least this high.
pub const ATTRACTOR_MIN_CONFIDENCE: f32 = 0.8;
/// ...and combined in/out edge degree at least this high.
pub const ATTRACTOR_MIN_DEGREE: usize = 4;
/// Basin membership requires similarity to the attractor at least this high.
pub const BASIN_MIN_SIMILARITY: f32 = 0.6;
/// Basin walk never looks past this many hops from the attractor.
pub const BASIN_MAX_HOPS: u32 = 2;
/// A settle step never moves a member's embedding by more than this much.
pub const MAX_STEP_NORM: f32 = 0.2;

/// A candidate attractor and the ids of the nodes in its basin.
pub struct Attractor {
    pub id: NodeId,
    pub basin: Vec<NodeId>,
}

/// Finds every node satisfying the attractor thresholds and computes each
/// one's basin via a breadth-limited walk of similar neighbors.
pub fn find_attractors(store: &TieredStore, indices: &Indices) -> Result<Vec<Attractor>> {
    let nodes = store.all_nodes()?;
    let mut attractors = Vec::new();

    for node in &nodes {
        if !node.has_embedding {
            continue;
        }
        if node.confidence.effective() < ATTRACTOR_MIN_CONFIDENCE {
            continue;
        }
        let degree = node.edges.len() + indices.reverse_edge.incoming(&node.id).len();
        if degree < ATTRACTOR_MIN_DEGREE {
            continue;
        }
        let basin = basin_walk(store, node)?;
        if !basin.is_empty() {
            attractors.push(Attractor { id: node.id, basin });
        }
    }

    Ok(attractors)
}

fn basin_walk(store: &TieredStore, attractor: &Node) -> Result<Vec<NodeId>> {
    let mut visited = std::collections::HashSet::new();
    let mut basin = Vec::new();
    let mut frontier = vec![(attractor.id, 0u32)];
    visited.insert(attractor.id);

    while let Some((id, depth)) = frontier.pop() {
        if depth >= BASIN_MAX_HOPS {
            continue;
        }
        let Some(node) = store.get(&id)? else { continue };
        for edge in &node.edges {
            if visited.contains(&edge.target) {
                continue;
            }
            let Some(neighbor) = store.get(&edge.target)? else { continue };
            if !neighbor.has_embedding {
                continue;
            }
            if attractor.embedding.cosine(&neighbor.embedding) >= BASIN_MIN_SIMILARITY {
                visited.insert(neighbor.id);
                basin.push(neighbor.id);
                frontier.push((neighbor.id, depth + 1));
            }
        }
    }

    Ok(basin)
}

/// Pulls every basin member's embedding a fraction `settle_strength` toward
/// the attractor's own embedding, with the per-step displacement capped at
/// [`MAX_STEP_NORM`].
pub fn run_attractor_dynamics(
    store: &TieredStore,
    attractors: &[Attractor],
    settle_strength: f32,
) -> Result<usize> {
    let mut settled = 0usize;
    for attractor in attractors {
        let Some(center) = store.get(&attractor.id)? else { continue };
        if !center.has_embedding {
            continue;
        }
        for member_id in &attractor.basin {
            let Some(member) = store.get(member_id)? else { continue };
            if !member.has_embedding {
                continue;
            }
            let pulled = settle_toward(&member.embedding, &center.embedding, settle_strength);
            store.update(member_id, None, Some(pulled))?;
            settled += 1;
        }
    }
    Ok(settled)
}

fn settle_toward(current: &Vector, target: &Vector, settle_strength: f32) -> Vector {
    let diff = target.add(&current.scale(-1.0));
    let step_norm = (diff.l2_norm() * settle_strength).min(MAX_STEP_NORM);
    let norm = diff.l2_norm();
    if norm <= f32::EPSILON {
        return current.clone();
    }
    let scaled = diff.scale(step_norm / norm);
    current.add(&scaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{EdgeType, NodeKind};
    use crate::storage::StoreConfig;
    use std::collections::HashSet;

    fn temp_store() -> TieredStore {
        let dir = tempfile::tempdir().unwrap();
        TieredStore::open(StoreConfig {
            path: dir.path().join("store"),
            hot_capacity: 100,
            warm_capacity: 100,
            embedding_dim: 2,
            decay_interval_ms: 1_000,
        })
        .unwrap()
    }

    #[test]
    fn settle_step_is_capped() {
        let current = Vector(vec![0.0, 0.0]);
        let target = Vector(vec![10.0, 0.0]);
        let moved = settle_toward(&current, &target, 1.0);
        assert!(moved.l2_norm() <= MAX_STEP_NORM + 1e-5);
    }

    #[test]
    fn basin_walk_finds_similar_connected_neighbor() {
        let store = temp_store();
        let a = store
            .remember(
                NodeKind::Belief,
                vec![],
                None,
                Some(Vector(vec![1.0, 0.0])),
                HashSet::new(),
                None,
            )
            .unwrap();
        let b = store
            .remember(
                NodeKind::Episode,
                vec![],
                None,
                Some(Vector(vec![0.99, 0.01])),
                HashSet::new(),
                None,
            )
            .unwrap();
        store.connect(&a, &b, EdgeType::Related, 0.5).unwrap();
        let attractor = store.get(&a).unwrap().unwrap();
        let basin = basin_walk(&store, &attractor).unwrap();
        assert_eq!(basin, vec![b]);
    }
}
