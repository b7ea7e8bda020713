//! End-to-end scenarios against a real `TempDir` store, one file per
//! scenario named in §8: store-and-recall, Hebbian co-activation, decay +
//! prune, forget cascade + rewire, crash recovery, causal chains.

use std::collections::HashSet;

use memonic_core::memory::{EdgeType, NodeKind};
use memonic_core::retrieval::{SearchMode, Zoom};
use memonic_core::{Config, MemoryEngine};
use tempfile::TempDir;

const DIM: usize = 8;

fn open(dir: &TempDir) -> MemoryEngine {
    let mut config = Config::default();
    config.store_path = dir.path().join("store");
    config.decay_interval_ms = 1_000;
    MemoryEngine::open_without_embeddings(config, DIM).unwrap()
}

#[test]
fn s1_store_and_recall_roundtrips_through_lexical_search() {
    let dir = TempDir::new().unwrap();
    let engine = open(&dir);

    let id = engine
        .remember(NodeKind::Episode, "the build failed because of a missing dependency".into(), None, HashSet::new(), None)
        .unwrap();

    let results = engine
        .recall("build failed dependency", 5, 0.0, SearchMode::Sparse, Zoom::Normal, None, false, false, false)
        .unwrap();

    assert!(results.iter().any(|r| r.id == id));
}

#[test]
fn s2_hebbian_coactivation_strengthens_edges() {
    let dir = TempDir::new().unwrap();
    let engine = open(&dir);

    let a = engine.remember(NodeKind::Episode, "parser emits an off-by-one error on empty input".into(), None, HashSet::new(), None).unwrap();
    let b = engine.remember(NodeKind::Episode, "empty input edge case in the tokenizer".into(), None, HashSet::new(), None).unwrap();

    engine.resonate("empty input edge case", 5, 1.0, true, 0.1).unwrap();

    let node_a = engine.get(&a).unwrap().unwrap();
    assert!(node_a.edges.iter().any(|e| e.target == b && e.weight > 0.05));
}

#[test]
fn s3_decay_then_prune_removes_low_confidence_unpinned_nodes() {
    let dir = TempDir::new().unwrap();
    let engine = open(&dir);

    let id = engine.remember(NodeKind::Episode, "ephemeral observation".into(), None, HashSet::new(), None).unwrap();
    for _ in 0..50 {
        engine.run_cycle(false).unwrap();
    }

    let survived = engine.get(&id).unwrap();
    assert!(survived.is_none());
}

#[test]
fn s4_forget_cascade_rewires_neighbors_without_dangling_edges() {
    let dir = TempDir::new().unwrap();
    let engine = open(&dir);

    let a = engine.remember(NodeKind::Episode, "a".into(), None, HashSet::new(), None).unwrap();
    let b = engine.remember(NodeKind::Episode, "b".into(), None, HashSet::new(), None).unwrap();
    let c = engine.remember(NodeKind::Episode, "c".into(), None, HashSet::new(), None).unwrap();
    engine.connect(&a, &b, EdgeType::Related, 0.6).unwrap();
    engine.connect(&b, &c, EdgeType::Related, 0.6).unwrap();

    engine.forget(b, true, true, 0.5).unwrap();

    assert!(engine.get(&b).unwrap().is_none());
    let node_a = engine.get(&a).unwrap().unwrap();
    assert!(node_a.edges.iter().all(|e| e.target != b));
    let node_c = engine.get(&c).unwrap();
    if let Some(node_c) = node_c {
        assert!(node_c.edges.iter().all(|e| e.target != b));
    }
}

#[test]
fn s5_crash_recovery_replays_wal_after_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let engine = open(&dir);
        let id = engine
            .remember(NodeKind::Episode, "durable note".into(), None, HashSet::new(), None)
            .unwrap();
        id
    };

    let reopened = open(&dir);
    let node = reopened.get(&id).unwrap().unwrap();
    assert_eq!(node.text.as_deref(), Some("durable note"));
}

#[test]
fn s6_causal_chains_respect_temporal_order() {
    let dir = TempDir::new().unwrap();
    let engine = open(&dir);

    let cause = engine.remember(NodeKind::Episode, "disk filled up".into(), None, HashSet::new(), None).unwrap();
    let effect = engine.remember(NodeKind::Episode, "write failed".into(), None, HashSet::new(), None).unwrap();
    engine.connect(&cause, &effect, EdgeType::Causes, 0.9).unwrap();

    let chains = engine.find_causal_chains(effect, 4, 0.1).unwrap();
    assert!(chains.iter().any(|c| c.path.contains(&cause)));
}

#[test]
fn empty_store_boundary_behavior() {
    let dir = TempDir::new().unwrap();
    let engine = open(&dir);

    let results = engine.recall("anything", 5, 0.0, SearchMode::Hybrid, Zoom::Normal, None, false, false, false).unwrap();
    assert!(results.is_empty());

    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_nodes, 0);

    let health = engine.health(7 * 24 * 3_600_000).unwrap();
    assert_eq!(health.capacity, 1.0);
}
