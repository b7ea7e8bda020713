//! Confidence decay: the per-cycle `μ ← μ · exp(−delta·Δt/decay_interval_ms)`
//! pass over every node, plus the truth-maintenance nudge for contradicted
//! nodes (see DESIGN.md's resolution of spec §9(d)).

use crate::id::NodeId;
use crate::memory::EdgeType;
use crate::storage::TieredStore;

use crate::error::Result;

/// Default penalty applied to the lower-effective-confidence side of a
/// `Contradicts` edge the next time decay runs.
pub const TRUTH_MAINTENANCE_PENALTY: f32 = 0.05;

/// Runs one decay pass over every node currently in the store, driven by
/// each node's own `delta`. One cycle is treated as one interval's worth of
/// elapsed time, so `dt_ms == decay_interval_ms` on schedule; a cycle that
/// ran late passes the actual elapsed time instead.
pub fn run_decay(store: &TieredStore, elapsed_ms: i64) -> Result<usize> {
    let mut decayed = 0usize;
    for id in store.all_ids()? {
        store.decay_node(&id, elapsed_ms)?;
        decayed += 1;
    }
    Ok(decayed)
}

/// Applies the truth-maintenance penalty to `loser` — the lower-effective-
/// confidence side of a contradiction — once per detected pair.
pub fn apply_truth_maintenance(store: &TieredStore, loser: &NodeId) -> Result<()> {
    store.apply_confidence_evidence(loser, -TRUTH_MAINTENANCE_PENALTY)
}

/// Scans every `Contradicts` edge in the store and nudges the lower-
/// effective-confidence endpoint down by [`TRUTH_MAINTENANCE_PENALTY`].
/// Run once per decay cycle, after decay itself so the penalty reflects the
/// freshly-decayed values.
pub fn run_truth_maintenance(store: &TieredStore) -> Result<usize> {
    let mut penalized = 0usize;
    for node in store.all_nodes()? {
        for edge in &node.edges {
            if edge.edge_type != EdgeType::Contradicts {
                continue;
            }
            let Some(other) = store.get(&edge.target)? else { continue };
            let loser = if node.confidence.effective() <= other.confidence.effective() {
                node.id
            } else {
                other.id
            };
            apply_truth_maintenance(store, &loser)?;
            penalized += 1;
        }
    }
    Ok(penalized)
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
    fn decay_reduces_confidence_over_time() {
        let store = temp_store();
        let id = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let before = store.get(&id).unwrap().unwrap().confidence.effective();
        run_decay(&store, 1_000).unwrap();
        let after = store.get(&id).unwrap().unwrap().confidence.effective();
        assert!(after <= before);
    }
}
