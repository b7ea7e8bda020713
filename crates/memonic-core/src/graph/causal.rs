//! Causal chain discovery: reverse breadth-first search from an effect node
//! along `Causes`/`Supports` edges, respecting temporal order, ranked by the
//! geometric mean of edge weights along each path.

use crate::id::NodeId;
use crate::index::Indices;
use crate::memory::EdgeType;
use crate::storage::TieredStore;

use crate::error::Result;

/// One discovered causal chain, source-to-effect order, with its geometric-
/// mean path confidence.
#[derive(Debug, Clone)]
pub struct CausalChain {
    pub path: Vec<NodeId>,
    pub confidence: f32,
}

/// Finds every simple path ending at `effect_id`, traversing `Causes`/
/// `Supports` edges backward (from effect to cause), bounded to `max_depth`
/// hops, requiring `source.tau_created <= target.tau_created` along each
/// step, and keeping only paths whose geometric-mean edge weight is
/// `>= min_confidence`. Ranked by that confidence, descending.
pub fn find_causal_chains(
    store: &TieredStore,
    indices: &Indices,
    effect_id: NodeId,
    max_depth: usize,
    min_confidence: f32,
) -> Result<Vec<CausalChain>> {
    let Some(effect) = store.get(&effect_id)? else {
        return Ok(Vec::new());
    };

    let mut chains = Vec::new();
    let mut stack: Vec<(NodeId, Vec<NodeId>, Vec<f32>, i64)> =
        vec![(effect_id, vec![effect_id], Vec::new(), effect.tau_created)];

    while let Some((current, path, weights, max_tau)) = stack.pop() {
        if path.len() as isize - 1 >= max_depth as isize {
            continue;
        }
        for incoming in indices.reverse_edge.incoming(&current) {
            if !matches!(incoming.edge_type, EdgeType::Causes | EdgeType::Supports) {
                continue;
            }
            if path.contains(&incoming.source) {
                continue;
            }
            let Some(cause) = store.get(&incoming.source)? else { continue };
            if cause.tau_created > max_tau {
                continue;
            }

            let mut next_path = path.clone();
            next_path.push(incoming.source);
            let mut next_weights = weights.clone();
            next_weights.push(incoming.weight.max(1e-6));

            let confidence = geometric_mean(&next_weights);
            if confidence >= min_confidence {
                chains.push(CausalChain {
                    path: next_path.clone(),
                    confidence,
                });
            }
            stack.push((incoming.source, next_path, next_weights, cause.tau_created));
        }
    }

    chains.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(chains)
}

fn geometric_mean(weights: &[f32]) -> f32 {
    if weights.is_empty() {
        return 0.0;
    }
    let log_sum: f32 = weights.iter().map(|w| w.max(1e-6).ln()).sum();
    (log_sum / weights.len() as f32).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Indices;
    use crate::memory::NodeKind;
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
    fn finds_single_hop_cause() {
        let store = temp_store();
        let mut indices = Indices::new(2, 1).unwrap();
        let cause = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let effect = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        store.connect(&cause, &effect, EdgeType::Causes, 0.9).unwrap();
        indices.reindex_edge(cause, effect, EdgeType::Causes, 0.9);

        let chains = find_causal_chains(&store, &indices, effect, 3, 0.1).unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].path, vec![effect, cause]);
    }

    #[test]
    fn geometric_mean_of_equal_weights_is_that_weight() {
        assert!((geometric_mean(&[0.5, 0.5, 0.5]) - 0.5).abs() < 1e-5);
    }
}
