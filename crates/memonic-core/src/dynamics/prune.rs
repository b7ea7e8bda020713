//! Prune: remove nodes whose effective confidence has decayed below
//! `prune_threshold`, skipping pinned kinds that are meant to persist
//! regardless of confidence (`Belief`, `Invariant`, `Intention`).

use crate::index::Indices;
use crate::storage::TieredStore;

use crate::error::Result;

/// Removes every non-pinned node below `prune_threshold`, returning how
/// many were removed.
pub fn run_prune(store: &TieredStore, indices: &mut Indices, prune_threshold: f32) -> Result<usize> {
    let mut pruned = 0usize;
    for node in store.all_nodes()? {
        if node.kind.is_pinned() {
            continue;
        }
        if node.confidence.effective() < prune_threshold {
            indices.remove_node(&node.id);
            store.forget(&node.id)?;
            pruned += 1;
        }
    }
    Ok(pruned)
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
    fn low_confidence_episode_is_pruned_but_belief_survives() {
        let store = temp_store();
        let mut indices = Indices::new(4, 1).unwrap();
        let episode = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let belief = store
            .remember(NodeKind::Belief, vec![], None, None, HashSet::new(), None)
            .unwrap();
        store.apply_confidence_evidence(&episode, 0.0).unwrap();
        store.apply_confidence_evidence(&belief, 0.0).unwrap();
        for _ in 0..50 {
            store.apply_confidence_evidence(&episode, 0.0).unwrap();
            store.apply_confidence_evidence(&belief, 0.0).unwrap();
        }
        let pruned = run_prune(&store, &mut indices, 0.5).unwrap();
        assert_eq!(pruned, 1);
        assert!(store.get(&episode).unwrap().is_none());
        assert!(store.get(&belief).unwrap().is_some());
    }
}
