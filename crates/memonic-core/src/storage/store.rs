//! The tiered store: owns every node record and is the sole authority on
//! which tier currently holds it. Indices elsewhere in this crate hold only
//! non-owning [`NodeId`] references and are rebuilt from this store on
//! demand.
//!
//! Concurrency discipline: the hot tier's [`DashMap`](dashmap::DashMap)
//! gives fine-grained per-node locking for the common case; `tier_lock`
//! guards the comparatively rare cross-tier moves (promotion/demotion,
//! forget) so a demotion can't race a concurrent promotion of the same node.
//! The WAL has its own mutex and is appended to *before* any in-memory
//! structure changes, matching the ordering guarantee that index updates are
//! sequenced after the corresponding WAL append.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::{info, instrument, warn};

use crate::id::NodeId;
use crate::memory::{Confidence, Edge, EdgeType, Node, NodeKind, Provenance, Tier};
use crate::time::now_millis;
use crate::vector::Vector;

use super::cold::{ColdMeta, ColdRecord};
use super::error::{Result, StorageError};
use super::snapshot::{self, STORE_FORMAT_VERSION};
use super::wal::{Wal, WalOp};
use super::warm::WarmSlab;

pub struct StoreConfig {
    pub path: PathBuf,
    pub hot_capacity: usize,
    pub warm_capacity: usize,
    pub embedding_dim: usize,
    /// Divisor for `Confidence::decay`'s `dt_ms/interval_ms` term; matches
    /// the scheduler's `decay_interval_ms` so one cycle's elapsed time maps
    /// to one unit of decay.
    pub decay_interval_ms: u64,
}

pub struct TieredStore {
    store_path: PathBuf,
    hot_capacity: usize,
    warm_capacity: usize,
    embedding_dim: usize,
    decay_interval_ms: u64,

    hot: super::hot::HotTier,
    warm_slab: WarmSlab,
    cold: ColdMeta,
    wal: Wal,

    tier_lock: RwLock<()>,
    generation: AtomicU64,
    emergency: AtomicBool,
}

impl TieredStore {
    #[instrument(skip(cfg))]
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        if let Some(parent) = cfg.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        #[cfg(unix)]
        if let Some(parent) = cfg.path.parent() {
            use std::os::unix::fs::PermissionsExt;
            if parent.exists() {
                let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700));
            }
        }

        let mut wal_path = cfg.path.clone().into_os_string();
        wal_path.push(".wal");
        let mut cold_path = cfg.path.clone().into_os_string();
        cold_path.push(".cold.sqlite3");
        let mut warm_path = cfg.path.clone().into_os_string();
        warm_path.push(".warm.slab");

        let hot = super::hot::HotTier::new();
        let warm_slab = WarmSlab::open(&warm_path)?;
        let cold = ColdMeta::open(&cold_path)?;
        let wal = Wal::open(&wal_path)?;

        let store = TieredStore {
            store_path: cfg.path,
            hot_capacity: cfg.hot_capacity,
            warm_capacity: cfg.warm_capacity,
            embedding_dim: cfg.embedding_dim,
            decay_interval_ms: cfg.decay_interval_ms.max(1),
            hot,
            warm_slab,
            cold,
            wal,
            tier_lock: RwLock::new(()),
            generation: AtomicU64::new(0),
            emergency: AtomicBool::new(false),
        };

        store.recover()?;
        Ok(store)
    }

    /// Loads the latest snapshot into the hot tier, then replays the WAL
    /// from `snapshot.lsn` forward.
    #[instrument(skip(self))]
    fn recover(&self) -> Result<()> {
        let from_lsn = match snapshot::load_latest_snapshot(&self.store_path)? {
            Some((header, nodes)) => {
                if header.format_version > STORE_FORMAT_VERSION {
                    return Err(StorageError::Init(format!(
                        "snapshot format version {} is newer than supported {}",
                        header.format_version, STORE_FORMAT_VERSION
                    )));
                }
                self.generation.store(header.generation, Ordering::SeqCst);
                for node in nodes {
                    self.hot.insert(node);
                }
                header.lsn + 1
            }
            None => 0,
        };

        let ops = self.wal.replay_from(from_lsn)?;
        info!(count = ops.len(), "replaying wal frames");
        for (_lsn, op) in ops {
            if let Err(e) = self.apply_op(&op) {
                warn!(error = %e, "skipping unreplayable wal frame");
            }
        }
        Ok(())
    }

    fn apply_op(&self, op: &WalOp) -> Result<()> {
        match op {
            WalOp::Remember {
                id,
                kind,
                payload_bytes,
                text,
                embedding,
                tags,
                provenance,
                tau_created,
            } => {
                let mut node = Node::new(
                    *kind,
                    payload_bytes.clone(),
                    text.clone(),
                    embedding.clone(),
                    tags.iter().cloned().collect(),
                    provenance.clone(),
                    self.embedding_dim,
                );
                node.id = *id;
                node.tau_created = *tau_created;
                node.tau_accessed = *tau_created;
                self.hot.insert(node);
            }
            WalOp::Update { id, text, embedding } => {
                self.mutate_anywhere(id, |n| {
                    if let Some(t) = text {
                        n.text = Some(t.clone());
                    }
                    if let Some(e) = embedding {
                        n.embedding = e.clone();
                        n.has_embedding = true;
                    }
                });
            }
            WalOp::AddTag { id, tag } => {
                self.mutate_anywhere(id, |n| {
                    n.add_tag(tag.clone());
                });
            }
            WalOp::RemoveTag { id, tag } => {
                self.mutate_anywhere(id, |n| {
                    n.remove_tag(tag);
                });
            }
            WalOp::Connect { source, edge } => {
                self.mutate_anywhere(source, |n| {
                    n.edges.push(edge.clone());
                });
            }
            WalOp::Disconnect {
                source,
                target,
                edge_type,
            } => {
                self.mutate_anywhere(source, |n| {
                    n.edges.retain(|e| {
                        !(e.target == *target && edge_type.map(|t| t == e.edge_type).unwrap_or(true))
                    });
                });
            }
            WalOp::Forget { id } => {
                self.remove_node(id)?;
            }
            WalOp::ConfidenceEvidence { id, x } => {
                self.mutate_anywhere(id, |n| {
                    n.confidence.apply_evidence(*x);
                });
            }
            WalOp::Decay { id, dt_ms } => {
                self.mutate_anywhere(id, |n| {
                    let delta = n.delta;
                    n.confidence.decay(delta, *dt_ms, self.decay_interval_ms);
                });
            }
            WalOp::Prune { id } => {
                self.remove_node(id)?;
            }
            WalOp::Tier { id, tier } => {
                self.mutate_anywhere(id, |n| n.tier = *tier);
            }
            WalOp::Access { id } => {
                self.mutate_anywhere(id, |n| n.mark_accessed());
            }
            WalOp::Epsilon { id, epsilon } => {
                self.mutate_anywhere(id, |n| n.epsilon = *epsilon);
            }
        }
        Ok(())
    }

    fn mutate_anywhere(&self, id: &NodeId, f: impl FnOnce(&mut Node)) -> bool {
        if self.hot.with_mut(id, f).is_some() {
            return true;
        }
        // Demoted nodes are mutated by reading, applying `f` to a
        // reconstructed Node, and writing the result back.
        if let Ok(Some(mut node)) = self.get(id) {
            f(&mut node);
            let _ = self.persist_demoted(&node);
            return true;
        }
        false
    }

    fn persist_demoted(&self, node: &Node) -> Result<()> {
        let warm_offset = if node.tier == Tier::Warm && node.has_embedding {
            Some(self.warm_slab.append(node.id, &node.embedding.quantize())?)
        } else {
            None
        };
        self.cold.upsert(&ColdRecord {
            id: node.id,
            kind: node.kind,
            payload_bytes: node.payload_bytes.clone(),
            text: node.text.clone(),
            tags: node.tags.iter().cloned().collect(),
            edges: node.edges.clone(),
            confidence: node.confidence,
            epsilon: node.epsilon,
            delta: node.delta,
            tau_created: node.tau_created,
            tau_accessed: node.tau_accessed,
            tier: node.tier,
            provenance: node.provenance.clone(),
            times_retrieved: node.times_retrieved,
            warm_offset,
        })
    }

    // -- public CRUD -----------------------------------------------------

    pub fn is_emergency(&self) -> bool {
        self.emergency.load(Ordering::SeqCst)
    }

    pub fn set_emergency(&self, value: bool) {
        self.emergency.store(value, Ordering::SeqCst);
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    #[allow(clippy::too_many_arguments)]
    pub fn remember(
        &self,
        kind: NodeKind,
        payload_bytes: Vec<u8>,
        text: Option<String>,
        embedding: Option<Vector>,
        tags: HashSet<String>,
        provenance: Option<Provenance>,
    ) -> Result<NodeId> {
        if self.emergency.load(Ordering::SeqCst) {
            return Err(StorageError::Emergency);
        }
        if let Some(v) = &embedding {
            if v.dim() != self.embedding_dim {
                return Err(StorageError::Init(format!(
                    "embedding dimension mismatch: expected {}, got {}",
                    self.embedding_dim,
                    v.dim()
                )));
            }
        }
        let node = Node::new(
            kind,
            payload_bytes.clone(),
            text.clone(),
            embedding.clone(),
            tags.clone(),
            provenance.clone(),
            self.embedding_dim,
        );
        let id = node.id;
        self.wal.append(&WalOp::Remember {
            id,
            kind,
            payload_bytes,
            text,
            embedding,
            tags: tags.into_iter().collect(),
            provenance,
            tau_created: node.tau_created,
        })?;
        self.wal.fsync()?;
        self.hot.insert(node);
        Ok(id)
    }

    pub fn get(&self, id: &NodeId) -> Result<Option<Node>> {
        if let Some(node) = self.hot.get(id) {
            return Ok(Some(node));
        }
        let Some(record) = self.cold.get(id)? else {
            return Ok(None);
        };
        let (embedding, has_embedding) = match record.warm_offset {
            Some(offset) => match self.warm_slab.read_at(offset)? {
                Some((_, qv)) => (qv.to_float(), true),
                None => (Vector::zero(self.embedding_dim), false),
            },
            None => (Vector::zero(self.embedding_dim), false),
        };
        Ok(Some(Node {
            id: record.id,
            kind: record.kind,
            payload_bytes: record.payload_bytes,
            text: record.text,
            embedding,
            has_embedding,
            confidence: record.confidence,
            epsilon: record.epsilon,
            delta: record.delta,
            tau_created: record.tau_created,
            tau_accessed: record.tau_accessed,
            tier: record.tier,
            tags: record.tags.into_iter().collect(),
            edges: record.edges,
            provenance: record.provenance,
            times_retrieved: record.times_retrieved,
        }))
    }

    pub fn contains(&self, id: &NodeId) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    pub fn update(&self, id: &NodeId, text: Option<String>, embedding: Option<Vector>) -> Result<()> {
        if !self.contains(id)? {
            return Err(StorageError::NotFound(id.to_string_hex()));
        }
        self.wal.append(&WalOp::Update {
            id: *id,
            text: text.clone(),
            embedding: embedding.clone(),
        })?;
        self.wal.fsync()?;
        self.mutate_anywhere(id, |n| {
            if let Some(t) = text {
                n.text = Some(t);
            }
            if let Some(e) = embedding {
                n.embedding = e;
                n.has_embedding = true;
            }
        });
        Ok(())
    }

    pub fn add_tag(&self, id: &NodeId, tag: String) -> Result<()> {
        if !self.contains(id)? {
            return Err(StorageError::NotFound(id.to_string_hex()));
        }
        self.wal.append(&WalOp::AddTag { id: *id, tag: tag.clone() })?;
        self.wal.fsync()?;
        self.mutate_anywhere(id, |n| {
            n.add_tag(tag);
        });
        Ok(())
    }

    pub fn remove_tag(&self, id: &NodeId, tag: &str) -> Result<()> {
        if !self.contains(id)? {
            return Err(StorageError::NotFound(id.to_string_hex()));
        }
        self.wal.append(&WalOp::RemoveTag {
            id: *id,
            tag: tag.to_string(),
        })?;
        self.wal.fsync()?;
        self.mutate_anywhere(id, |n| {
            n.remove_tag(tag);
        });
        Ok(())
    }

    /// Neither side is mutated unless both exist.
    pub fn connect(&self, source: &NodeId, target: &NodeId, edge_type: EdgeType, weight: f32) -> Result<()> {
        if !self.contains(source)? || !self.contains(target)? {
            return Err(StorageError::NotFound(format!(
                "{source} or {target}"
            )));
        }
        let edge = Edge::new(*target, edge_type, weight);
        self.wal.append(&WalOp::Connect {
            source: *source,
            edge: edge.clone(),
        })?;
        self.wal.fsync()?;
        self.mutate_anywhere(source, |n| n.edges.push(edge));
        Ok(())
    }

    pub fn disconnect(&self, source: &NodeId, target: &NodeId, edge_type: Option<EdgeType>) -> Result<()> {
        self.wal.append(&WalOp::Disconnect {
            source: *source,
            target: *target,
            edge_type,
        })?;
        self.wal.fsync()?;
        self.mutate_anywhere(source, |n| {
            n.edges.retain(|e| {
                !(e.target == *target && edge_type.map(|t| t == e.edge_type).unwrap_or(true))
            });
        });
        Ok(())
    }

    /// Strengthens (or creates) a Hebbian edge from `source` to `target`,
    /// clamped at 1.0.
    pub fn hebbian_strengthen(&self, source: &NodeId, target: &NodeId, delta: f32) -> Result<()> {
        if !self.contains(source)? || !self.contains(target)? {
            return Ok(());
        }
        let existing_weight = self
            .get(source)?
            .and_then(|n| {
                n.edges
                    .iter()
                    .find(|e| e.target == *target && e.edge_type == EdgeType::Hebbian)
                    .map(|e| e.weight)
            });

        match existing_weight {
            Some(w) => {
                let new_weight = (w + delta).clamp(0.0, 1.0);
                self.wal.append(&WalOp::Disconnect {
                    source: *source,
                    target: *target,
                    edge_type: Some(EdgeType::Hebbian),
                })?;
                let edge = Edge::new(*target, EdgeType::Hebbian, new_weight);
                self.wal.append(&WalOp::Connect { source: *source, edge: edge.clone() })?;
                self.wal.fsync()?;
                self.mutate_anywhere(source, |n| {
                    n.edges.retain(|e| !(e.target == *target && e.edge_type == EdgeType::Hebbian));
                    n.edges.push(edge);
                });
            }
            None => {
                self.connect(source, target, EdgeType::Hebbian, delta.clamp(0.0, 1.0))?;
            }
        }
        Ok(())
    }

    pub fn apply_confidence_evidence(&self, id: &NodeId, x: f32) -> Result<()> {
        self.wal.append(&WalOp::ConfidenceEvidence { id: *id, x })?;
        self.mutate_anywhere(id, |n| n.confidence.apply_evidence(x));
        Ok(())
    }

    pub fn decay_node(&self, id: &NodeId, dt_ms: i64) -> Result<()> {
        self.wal.append(&WalOp::Decay { id: *id, dt_ms })?;
        self.mutate_anywhere(id, |n| {
            let delta = n.delta;
            n.confidence.decay(delta, dt_ms, self.decay_interval_ms);
        });
        Ok(())
    }

    pub fn set_epsilon(&self, id: &NodeId, epsilon: f32) -> Result<()> {
        self.wal.append(&WalOp::Epsilon { id: *id, epsilon })?;
        self.mutate_anywhere(id, |n| n.epsilon = epsilon);
        Ok(())
    }

    pub fn mark_accessed(&self, id: &NodeId) -> Result<()> {
        self.wal.append(&WalOp::Access { id: *id })?;
        self.mutate_anywhere(id, |n| n.mark_accessed());
        Ok(())
    }

    /// Removes a node and drops every other node's edges into it. Does not
    /// itself implement cascade/rewire — that's graph-level policy living in
    /// the retrieval layer, which calls this once it has done its own
    /// bookkeeping.
    pub fn remove_node(&self, id: &NodeId) -> Result<()> {
        let _guard = self
            .tier_lock
            .write()
            .map_err(|_| StorageError::Init("tier lock poisoned".into()))?;
        self.hot.remove(id);
        self.cold.remove(id)?;
        for other_id in self.all_ids()? {
            self.mutate_anywhere(&other_id, |n| n.edges.retain(|e| e.target != *id));
        }
        Ok(())
    }

    pub fn forget(&self, id: &NodeId) -> Result<()> {
        self.wal.append(&WalOp::Forget { id: *id })?;
        self.wal.fsync()?;
        self.remove_node(id)
    }

    pub fn quarantine(&self, id: &NodeId, reason: &str) -> Result<()> {
        self.hot.remove(id);
        self.cold.quarantine(id, reason, now_millis())
    }

    // -- bulk access for indices/algorithms -------------------------------

    pub fn all_ids(&self) -> Result<Vec<NodeId>> {
        let mut ids = self.hot.ids();
        ids.extend(self.cold.all_ids()?);
        Ok(ids)
    }

    pub fn all_nodes(&self) -> Result<Vec<Node>> {
        self.all_ids()?
            .into_iter()
            .filter_map(|id| self.get(&id).transpose())
            .collect()
    }

    pub fn hot_count(&self) -> usize {
        self.hot.len()
    }

    pub fn warm_count(&self) -> Result<usize> {
        self.cold.count_tier(Tier::Warm)
    }

    pub fn cold_count(&self) -> Result<usize> {
        self.cold.count_tier(Tier::Cold)
    }

    pub fn quarantined_count(&self) -> Result<usize> {
        self.cold.quarantined_count()
    }

    // -- tiering -----------------------------------------------------------

    /// Demotes the lowest-priority hot nodes (oldest `tau_accessed`, then
    /// lowest effective confidence, then lowest epsilon) older than
    /// `hot_age_ms` down to Warm, and the analogous Warm nodes down to Cold,
    /// respecting capacities.
    #[instrument(skip(self))]
    pub fn rebalance_tiers(&self, hot_age_ms: i64, warm_age_ms: i64) -> Result<(usize, usize)> {
        let now = now_millis();
        let mut demoted_to_warm = 0usize;
        let mut demoted_to_cold = 0usize;

        // Every node aged past `hot_age_ms` is demoted outright; nodes under
        // that age only move if the hot tier is over capacity, in which case
        // the lowest-priority ones (oldest, least confident, least compact)
        // go first.
        let mut aged = self.hot.oldest_first(now - hot_age_ms);
        aged.sort_by(priority_for_demotion);
        for mut node in aged {
            node.tier = Tier::Warm;
            self.persist_demoted(&node)?;
            self.hot.remove(&node.id);
            demoted_to_warm += 1;
        }

        let over_capacity = self.hot.len().saturating_sub(self.hot_capacity);
        if over_capacity > 0 {
            let mut rest = self.hot.all();
            rest.sort_by(priority_for_demotion);
            for mut node in rest.into_iter().take(over_capacity) {
                node.tier = Tier::Warm;
                self.persist_demoted(&node)?;
                self.hot.remove(&node.id);
                demoted_to_warm += 1;
            }
        }

        let warm_over = self.warm_count()?.saturating_sub(self.warm_capacity);
        if warm_over > 0 {
            let mut warm_ids = self.cold.all_ids()?;
            warm_ids.retain(|id| {
                self.cold
                    .get(id)
                    .ok()
                    .flatten()
                    .map(|r| r.tier == Tier::Warm && r.tau_accessed < now - warm_age_ms)
                    .unwrap_or(false)
            });
            for id in warm_ids.into_iter().take(warm_over) {
                if let Some(mut record) = self.cold.get(&id)? {
                    record.tier = Tier::Cold;
                    record.warm_offset = None;
                    self.cold.upsert(&record)?;
                    demoted_to_cold += 1;
                }
            }
        }

        Ok((demoted_to_warm, demoted_to_cold))
    }

    // -- durability ----------------------------------------------------------

    #[instrument(skip(self))]
    pub fn checkpoint(&self) -> Result<()> {
        let _guard = self
            .tier_lock
            .write()
            .map_err(|_| StorageError::Init("tier lock poisoned".into()))?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let nodes = self.hot.all();
        let lsn = self.wal.replay_from(0)?.last().map(|(lsn, _)| *lsn).unwrap_or(0);
        snapshot::write_snapshot(&self.store_path, generation, lsn, self.embedding_dim, &nodes)?;
        self.wal.reset_after_snapshot(lsn)?;
        snapshot::prune_old_generations(&self.store_path, generation)?;
        info!(generation, node_count = nodes.len(), "checkpoint complete");
        Ok(())
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

fn priority_for_demotion(a: &Node, b: &Node) -> std::cmp::Ordering {
    a.tau_accessed
        .cmp(&b.tau_accessed)
        .then(a.effective_confidence().total_cmp(&b.effective_confidence()))
        .then(a.epsilon.total_cmp(&b.epsilon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NodeKind;

    fn open_test_store() -> (tempfile::TempDir, TieredStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TieredStore::open(StoreConfig {
            path: dir.path().join("store"),
            hot_capacity: 1000,
            warm_capacity: 1000,
            embedding_dim: 4,
            decay_interval_ms: 1_000,
        })
        .unwrap();
        (dir, store)
    }

    #[test]
    fn remember_then_get_roundtrips_payload_and_kind() {
        let (_dir, store) = open_test_store();
        let id = store
            .remember(
                NodeKind::Episode,
                b"hello".to_vec(),
                Some("hello".into()),
                None,
                HashSet::new(),
                None,
            )
            .unwrap();
        let node = store.get(&id).unwrap().unwrap();
        assert_eq!(node.payload_bytes, b"hello");
        assert_eq!(node.kind, NodeKind::Episode);
    }

    #[test]
    fn remember_rejects_dimension_mismatch() {
        let (_dir, store) = open_test_store();
        let result = store.remember(
            NodeKind::Episode,
            vec![],
            None,
            Some(Vector(vec![1.0, 2.0])),
            HashSet::new(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn connect_requires_both_endpoints() {
        let (_dir, store) = open_test_store();
        let a = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let missing = NodeId::new();
        let result = store.connect(&a, &missing, EdgeType::Related, 0.5);
        assert!(result.is_err());
        assert!(store.get(&a).unwrap().unwrap().edges.is_empty());
    }

    #[test]
    fn forget_removes_node_and_inbound_edges() {
        let (_dir, store) = open_test_store();
        let a = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let b = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        store.connect(&a, &b, EdgeType::Related, 0.5).unwrap();
        store.forget(&b).unwrap();
        assert!(store.get(&b).unwrap().is_none());
        assert!(store.get(&a).unwrap().unwrap().edges.is_empty());
    }

    #[test]
    fn add_tag_is_a_noop_success_on_duplicate() {
        let (_dir, store) = open_test_store();
        let a = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        store.add_tag(&a, "x".into()).unwrap();
        store.add_tag(&a, "x".into()).unwrap();
        assert_eq!(store.get(&a).unwrap().unwrap().tags.len(), 1);
    }

    #[test]
    fn checkpoint_then_reopen_recovers_all_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");
        let ids: Vec<NodeId>;
        {
            let store = TieredStore::open(StoreConfig {
                path: path.clone(),
                hot_capacity: 1000,
                warm_capacity: 1000,
                embedding_dim: 4,
            decay_interval_ms: 1_000,
            })
            .unwrap();
            let mut collected = Vec::new();
            for i in 0..5 {
                collected.push(
                    store
                        .remember(
                            NodeKind::Episode,
                            format!("n{i}").into_bytes(),
                            None,
                            None,
                            HashSet::new(),
                            None,
                        )
                        .unwrap(),
                );
            }
            store.checkpoint().unwrap();
            ids = collected;
        }
        let store2 = TieredStore::open(StoreConfig {
            path,
            hot_capacity: 1000,
            warm_capacity: 1000,
            embedding_dim: 4,
            decay_interval_ms: 1_000,
        })
        .unwrap();
        for id in ids {
            assert!(store2.get(&id).unwrap().is_some());
        }
    }

    #[test]
    fn hebbian_strengthen_creates_then_strengthens_edge() {
        let (_dir, store) = open_test_store();
        let a = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        let b = store
            .remember(NodeKind::Episode, vec![], None, None, HashSet::new(), None)
            .unwrap();
        store.hebbian_strengthen(&a, &b, 0.05).unwrap();
        store.hebbian_strengthen(&a, &b, 0.05).unwrap();
        let edge = store
            .get(&a)
            .unwrap()
            .unwrap()
            .edges
            .into_iter()
            .find(|e| e.target == b && e.edge_type == EdgeType::Hebbian)
            .unwrap();
        assert!((edge.weight - 0.10).abs() < 1e-5);
    }
}
