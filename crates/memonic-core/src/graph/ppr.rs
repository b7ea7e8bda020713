//! Approximate personalized PageRank via the local-push algorithm: cheap
//! enough to run per-query against a personalization vector derived from the
//! top-M nodes similar to the query embedding.

use std::collections::HashMap;

use crate::id::NodeId;
use crate::index::Indices;
use crate::storage::TieredStore;
use crate::vector::Vector;

use crate::error::Result;

/// How many of the dense-similar nodes seed the personalization vector.
pub const SEED_CANDIDATES: usize = 8;
/// PPR damping factor (probability of continuing the random walk).
pub const ALPHA: f32 = 0.85;

/// Embeds nothing itself — takes an already-embedded `query` vector, finds
/// its top [`SEED_CANDIDATES`] similar nodes via the ANN index to build a
/// personalization vector, then runs local-push PageRank seeded there.
/// Stops pushing residual mass once every node's residual is below
/// `epsilon`. Returns the top-`k` nodes by PPR mass.
pub fn ppr_query(
    store: &TieredStore,
    indices: &Indices,
    query: &Vector,
    k: usize,
    epsilon: f32,
) -> Result<Vec<(NodeId, f32)>> {
    let seeds = indices.ann.search(query, SEED_CANDIDATES)?;
    if seeds.is_empty() {
        return Ok(Vec::new());
    }
    let total: f32 = seeds.iter().map(|(_, s)| s.max(0.0)).sum::<f32>().max(1e-6);
    let personalization: HashMap<NodeId, f32> = seeds
        .into_iter()
        .map(|(id, s)| (id, s.max(0.0) / total))
        .collect();

    let scores = local_push(store, &personalization, epsilon)?;
    let mut ranked: Vec<(NodeId, f32)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    Ok(ranked)
}

/// Forward local-push: maintains `(p, r)` — accumulated rank and residual —
/// pushing each node's residual mass to itself (weighted by `alpha`) and its
/// out-neighbors (the remainder, split evenly), until every residual drops
/// below `epsilon`. `O(1/epsilon)` total pushes.
fn local_push(
    store: &TieredStore,
    personalization: &HashMap<NodeId, f32>,
    epsilon: f32,
) -> Result<HashMap<NodeId, f32>> {
    let mut p: HashMap<NodeId, f32> = HashMap::new();
    let mut r: HashMap<NodeId, f32> = personalization.clone();

    let mut queue: Vec<NodeId> = r.keys().copied().collect();
    let mut guard = 0usize;
    const MAX_PUSHES: usize = 200_000;

    while let Some(id) = queue.pop() {
        guard += 1;
        if guard > MAX_PUSHES {
            break;
        }
        let residual = *r.get(&id).unwrap_or(&0.0);
        if residual < epsilon {
            continue;
        }
        *p.entry(id).or_insert(0.0) += ALPHA * residual;
        let push_out = (1.0 - ALPHA) * residual;
        r.insert(id, 0.0);

        let Some(node) = store.get(&id)? else { continue };
        if node.edges.is_empty() {
            continue;
        }
        let share = push_out / node.edges.len() as f32;
        for edge in &node.edges {
            let entry = r.entry(edge.target).or_insert(0.0);
            *entry += share;
            if *entry >= epsilon {
                queue.push(edge.target);
            }
        }
    }

    Ok(p)
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
    fn seed_node_accumulates_more_mass_than_an_unconnected_node() {
        let store = temp_store();
        let seed = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let neighbor = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let unrelated = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        store.connect(&seed, &neighbor, EdgeType::Related, 1.0).unwrap();

        let personalization = HashMap::from([(seed, 1.0)]);
        let scores = local_push(&store, &personalization, 0.0001).unwrap();
        assert!(scores.get(&seed).copied().unwrap_or(0.0) > 0.0);
        assert!(
            scores.get(&seed).copied().unwrap_or(0.0)
                >= scores.get(&unrelated).copied().unwrap_or(0.0)
        );
    }
}
