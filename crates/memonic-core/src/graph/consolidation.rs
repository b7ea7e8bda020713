//! LSH-backed near-duplicate consolidation: cheap candidate lookups via
//! bucket collisions, followed by exact cosine re-scoring for the handful of
//! candidates that survive.

use crate::id::NodeId;
use crate::index::Indices;
use crate::storage::TieredStore;
use crate::vector::Vector;

use crate::error::Result;

/// Candidates must clear this exact-cosine bar after the LSH prefilter to
/// count as a near-duplicate.
pub const CONSOLIDATION_MIN_COSINE: f32 = 0.92;
/// Hamming-distance slack used when looking up similar vectors that are not
/// already indexed (looser than exact-bucket matching).
pub const DEFAULT_HAMMING_SLACK: u32 = 2;

/// Returns up to `k` ids whose LSH signature is within [`DEFAULT_HAMMING_SLACK`]
/// bits of `vector`'s, suitable as downstream input to exact comparison.
pub fn lsh_find_similar(indices: &Indices, vector: &Vector, k: usize) -> Vec<NodeId> {
    let mut candidates = indices.lsh.candidates_within(vector, DEFAULT_HAMMING_SLACK);
    candidates.truncate(k);
    candidates
}

/// One near-duplicate pair found during a consolidation pass.
#[derive(Debug, Clone)]
pub struct DuplicatePair {
    pub a: NodeId,
    pub b: NodeId,
    pub cosine: f32,
}

/// Scans every node with an embedding, using its LSH bucket candidates as
/// the only comparisons attempted (`O(candidate * D)` per node, per the
/// complexity note this module is grounded on), and reports every pair
/// above [`CONSOLIDATION_MIN_COSINE`].
pub fn find_near_duplicates(store: &TieredStore, indices: &Indices) -> Result<Vec<DuplicatePair>> {
    let nodes = store.all_nodes()?;
    let mut pairs = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for node in &nodes {
        if !node.has_embedding {
            continue;
        }
        for candidate_id in indices.lsh.candidates(&node.id) {
            let key = if node.id.0 < candidate_id.0 {
                (node.id, candidate_id)
            } else {
                (candidate_id, node.id)
            };
            if !seen.insert(key) {
                continue;
            }
            let Some(other) = store.get(&candidate_id)? else { continue };
            if !other.has_embedding {
                continue;
            }
            let cosine = node.embedding.cosine(&other.embedding);
            if cosine >= CONSOLIDATION_MIN_COSINE {
                pairs.push(DuplicatePair {
                    a: node.id,
                    b: candidate_id,
                    cosine,
                });
            }
        }
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NodeKind;
    use crate::storage::StoreConfig;
    use std::collections::HashSet;

    fn temp_store() -> TieredStore {
        let dir = tempfile::tempdir().unwrap();
        TieredStore::open(StoreConfig {
            path: dir.path().join("store"),
            hot_capacity: 100,
            warm_capacity: 100,
            embedding_dim: 4,
            decay_interval_ms: 1_000,
        })
        .unwrap()
    }

    #[test]
    fn identical_embeddings_are_reported_as_near_duplicates() {
        let store = temp_store();
        let mut indices = Indices::new(4, 5).unwrap();
        let v = Vector(vec![1.0, 0.5, -0.3, 0.2]);
        let a = store
            .remember(NodeKind::Episode, vec![], None, Some(v.clone()), HashSet::new(), None)
            .unwrap();
        let b = store
            .remember(NodeKind::Episode, vec![], None, Some(v.clone()), HashSet::new(), None)
            .unwrap();
        indices.lsh.insert(a, &v);
        indices.lsh.insert(b, &v);

        let pairs = find_near_duplicates(&store, &indices).unwrap();
        assert_eq!(pairs.len(), 1);
    }
}
