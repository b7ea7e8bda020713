//! Hawkes-process-weighted recency timeline: nodes accessed recently score
//! higher, with each access event self-exciting the score so frequently
//! re-retrieved nodes rise faster than ones accessed only once.

use crate::id::NodeId;
use crate::storage::TieredStore;
use crate::time::now_millis;

use crate::error::Result;

/// Excitation amplitude per access event.
pub const ALPHA: f64 = 1.0;

/// `beta` tuned so the contribution of a single event halves after
/// `hours/4`: `exp(-beta * halflife_ms) = 0.5`.
fn beta_for_halflife_ms(halflife_ms: f64) -> f64 {
    std::f64::consts::LN_2 / halflife_ms.max(1.0)
}

/// Scores every node whose `tau_accessed` falls within the last `hours`,
/// approximating the self-exciting Hawkes intensity with each node's single
/// known event (`tau_accessed`) plus a `times_retrieved` multiplier standing
/// in for the unlogged individual access timestamps. Returns the top
/// `limit` nodes by score, descending.
pub fn hawkes_timeline(store: &TieredStore, hours: f64, limit: usize) -> Result<Vec<(NodeId, f64)>> {
    let now = now_millis();
    let window_ms = (hours * 3_600_000.0) as i64;
    let halflife_ms = (hours / 4.0) * 3_600_000.0;
    let beta = beta_for_halflife_ms(halflife_ms);

    let mut scored: Vec<(NodeId, f64)> = Vec::new();
    for node in store.all_nodes()? {
        let age_ms = (now - node.tau_accessed).max(0);
        if age_ms > window_ms {
            continue;
        }
        let decay = (-beta * age_ms as f64).exp();
        let excitation = ALPHA * (node.times_retrieved.max(1) as f64).ln_1p();
        let score = excitation * decay;
        if score > 0.0 {
            scored.push((node.id, score));
        }
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    Ok(scored)
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
            embedding_dim: 2,
            decay_interval_ms: 1_000,
        })
        .unwrap()
    }

    #[test]
    fn recently_accessed_node_appears_in_timeline() {
        let store = temp_store();
        let id = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let timeline = hawkes_timeline(&store, 24.0, 10).unwrap();
        assert!(timeline.iter().any(|(i, _)| *i == id));
    }

    #[test]
    fn halflife_decay_roughly_halves_score() {
        let halflife_ms = 3_600_000.0;
        let beta = beta_for_halflife_ms(halflife_ms);
        let score_at_zero = (-beta * 0.0_f64).exp();
        let score_at_halflife = (-beta * halflife_ms).exp();
        assert!((score_at_halflife - 0.5 * score_at_zero).abs() < 1e-9);
    }
}
