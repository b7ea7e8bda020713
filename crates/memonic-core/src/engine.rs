//! The programmatic API surface: a [`MemoryEngine`] bundles the tiered
//! store, its indices, the feedback queue, session context, and the
//! capability objects (embedder, symbol extractor, summarizer) behind the
//! typed operations a dispatcher wraps (§4.10). Retrieval and dynamics stay
//! as free functions elsewhere in this crate operating on borrowed
//! store/indices references; this module is just the thing that owns them
//! together and exposes one call per public operation in spec §4.6/§4.7.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::Config;
use crate::dynamics::feedback::{FeedbackEvent, FeedbackKind, FeedbackQueue};
use crate::dynamics::{self, CycleReport};
use crate::error::{MemonicError, Result};
use crate::external::{Embedder, NaiveSummarizer, NullEmbedder, NullSymbolExtractor, Summarizer, SymbolExtractor};
use crate::graph;
use crate::health::{self, HealthScore, RecoveryReport};
use crate::id::NodeId;
use crate::index::Indices;
use crate::memory::{EdgeType, MemoryStats, Node, NodeKind, Provenance};
use crate::retrieval::{self, Recall, RecallOptions, SearchMode, Zoom};
use crate::session::SessionContext;
use crate::storage::{StoreConfig, TieredStore};
use crate::vector::Vector;

/// A named, timestamped session snapshot — stored as an Episode node
/// (§3 "Ledger") and additionally tracked here so `ledger_list` doesn't need
/// to scan every node by tag.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub name: String,
    pub node_id: NodeId,
    pub tau_created: i64,
}

/// Bundles everything a request handler needs: the durable store, the
/// rebuildable indices (guarded by one `RwLock` since index mutation is
/// always a short critical section), the feedback queue, session context,
/// and the entity/ledger registries. One instance per open store.
pub struct MemoryEngine {
    store: TieredStore,
    indices: RwLock<Indices>,
    feedback: FeedbackQueue,
    session: RwLock<SessionContext>,
    embedder: Arc<dyn Embedder>,
    symbol_extractor: Arc<dyn SymbolExtractor>,
    summarizer: Arc<dyn Summarizer>,
    entities: RwLock<HashMap<String, NodeId>>,
    ledgers: RwLock<Vec<LedgerEntry>>,
    config: Config,
}

impl MemoryEngine {
    /// Opens (or creates) a store at `config.store_path`. Indices start
    /// empty and are rebuilt from the store's node set before returning, so
    /// a fresh daemon process is always "yantra-ready" for whatever the
    /// store already holds.
    #[instrument(skip(config, embedder, symbol_extractor, summarizer))]
    pub fn open(
        config: Config,
        embedding_dim: usize,
        embedder: Arc<dyn Embedder>,
        symbol_extractor: Arc<dyn SymbolExtractor>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self> {
        let store = TieredStore::open(StoreConfig {
            path: config.store_path.clone(),
            hot_capacity: config.hot_capacity,
            warm_capacity: config.warm_capacity,
            embedding_dim,
            decay_interval_ms: config.decay_interval_ms,
        })?;

        let mut indices = Indices::new(embedding_dim, 0x5bd1e995)?;
        let nodes = store.all_nodes()?;
        indices.rebuild(&nodes, config.skip_bm25);

        info!(nodes = nodes.len(), "memory engine opened");

        Ok(MemoryEngine {
            store,
            indices: RwLock::new(indices),
            feedback: FeedbackQueue::new(),
            session: RwLock::new(SessionContext::new()),
            embedder,
            symbol_extractor,
            summarizer,
            entities: RwLock::new(HashMap::new()),
            ledgers: RwLock::new(Vec::new()),
            config,
        })
    }

    /// A store with no real embedder wired in — used by the CLI/daemon when
    /// `MODEL_PATH` isn't configured, and by tests.
    pub fn open_without_embeddings(config: Config, embedding_dim: usize) -> Result<Self> {
        Self::open(
            config,
            embedding_dim,
            Arc::new(NullEmbedder::new(embedding_dim)),
            Arc::new(NullSymbolExtractor),
            Arc::new(NaiveSummarizer),
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn lock_poisoned() -> MemonicError {
        MemonicError::Internal("indices lock poisoned".into())
    }

    // -- creation / mutation ----------------------------------------------

    /// `remember(kind, payload, [embedding], [tags], [provenance])`. Embeds
    /// the text when no embedding is supplied and the embedder is available;
    /// on embedder failure the node is stored with a zero vector (flagged
    /// via `has_embedding=false`) per the embedder error taxonomy (§7).
    #[allow(clippy::too_many_arguments)]
    pub fn remember(
        &self,
        kind: NodeKind,
        text: String,
        embedding: Option<Vector>,
        tags: HashSet<String>,
        provenance: Option<Provenance>,
    ) -> Result<NodeId> {
        let embedding = match embedding {
            Some(v) => Some(v),
            None => self.embedder.embed(&text).ok(),
        };
        let id = self.store.remember(
            kind,
            text.clone().into_bytes(),
            Some(text),
            embedding,
            tags,
            provenance,
        )?;
        let node = self.store.get(&id)?.expect("just-inserted node must exist");
        let mut indices = self.indices.write().map_err(|_| Self::lock_poisoned())?;
        indices.index_node(&node, self.config.skip_bm25);
        Ok(id)
    }

    /// `observe`/`grow` creation shorthand (§4.10): remembers an Episode by
    /// default, tagged with whatever the caller supplies plus `observed`.
    pub fn observe(&self, text: String, tags: HashSet<String>) -> Result<NodeId> {
        let mut tags = tags;
        tags.insert("observed".to_string());
        self.session.write().map_err(|_| Self::lock_poisoned())?.observe(text.clone());
        self.remember(NodeKind::Episode, text, None, tags, None)
    }

    pub fn get(&self, id: &NodeId) -> Result<Option<Node>> {
        Ok(self.store.get(id)?)
    }

    pub fn update(&self, id: &NodeId, text: Option<String>) -> Result<()> {
        let embedding = match &text {
            Some(t) => self.embedder.embed(t).ok(),
            None => None,
        };
        self.store.update(id, text, embedding)?;
        Ok(())
    }

    pub fn add_tag(&self, id: &NodeId, tag: String) -> Result<()> {
        self.store.add_tag(id, tag.clone())?;
        let mut indices = self.indices.write().map_err(|_| Self::lock_poisoned())?;
        indices.tag.add_tag(*id, &tag);
        Ok(())
    }

    pub fn remove_tag(&self, id: &NodeId, tag: &str) -> Result<()> {
        self.store.remove_tag(id, tag)?;
        let mut indices = self.indices.write().map_err(|_| Self::lock_poisoned())?;
        indices.tag.remove_tag(*id, tag);
        Ok(())
    }

    /// `connect`: errors without mutating either side if source or target is
    /// missing (§8 boundary behavior).
    pub fn connect(&self, source: &NodeId, target: &NodeId, edge_type: EdgeType, weight: f32) -> Result<()> {
        if self.store.get(source)?.is_none() {
            return Err(MemonicError::NotFound(source.to_string_hex()));
        }
        if self.store.get(target)?.is_none() {
            return Err(MemonicError::NotFound(target.to_string_hex()));
        }
        self.store.connect(source, target, edge_type, weight)?;
        let mut indices = self.indices.write().map_err(|_| Self::lock_poisoned())?;
        indices.reindex_edge(*source, *target, edge_type, weight);
        Ok(())
    }

    pub fn disconnect(&self, source: &NodeId, target: &NodeId, edge_type: Option<EdgeType>) -> Result<()> {
        self.store.disconnect(source, target, edge_type)?;
        let mut indices = self.indices.write().map_err(|_| Self::lock_poisoned())?;
        if let Some(et) = edge_type {
            indices.unindex_edge(source, target, et);
        } else {
            for et in [
                EdgeType::Mentions,
                EdgeType::Causes,
                EdgeType::IsA,
                EdgeType::PartOf,
                EdgeType::Supports,
                EdgeType::Contradicts,
                EdgeType::Related,
                EdgeType::Hebbian,
            ] {
                indices.unindex_edge(source, target, et);
            }
        }
        Ok(())
    }

    // -- retrieval ----------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn recall(
        &self,
        query_text: &str,
        limit: usize,
        threshold: f32,
        mode: SearchMode,
        zoom: Zoom,
        tag: Option<String>,
        primed: bool,
        learn: bool,
        compete: bool,
    ) -> Result<Vec<Recall>> {
        let opts = RecallOptions {
            limit,
            threshold,
            mode,
            zoom,
            tag,
            primed,
            learn,
            compete,
            ..RecallOptions::default()
        };
        let indices = self.indices.read().map_err(|_| Self::lock_poisoned())?;
        let session = self.session.read().map_err(|_| Self::lock_poisoned())?;
        retrieval::recall(
            &self.store,
            &indices,
            self.embedder.as_ref(),
            &self.feedback,
            Some(&session),
            query_text,
            &opts,
        )
    }

    pub fn resonate(
        &self,
        query_text: &str,
        limit: usize,
        spread_strength: f32,
        learn: bool,
        hebbian_strength: f32,
    ) -> Result<Vec<Recall>> {
        let indices = self.indices.read().map_err(|_| Self::lock_poisoned())?;
        retrieval::resonate(
            &self.store,
            &indices,
            self.embedder.as_ref(),
            &self.feedback,
            query_text,
            limit,
            spread_strength,
            learn,
            hebbian_strength,
        )
    }

    pub fn full_resonate(
        &self,
        query_text: &str,
        limit: usize,
        spread_strength: f32,
        hebbian_strength: f32,
        exclude_tags: Vec<String>,
    ) -> Result<Vec<Recall>> {
        let indices = self.indices.read().map_err(|_| Self::lock_poisoned())?;
        let session = self.session.read().map_err(|_| Self::lock_poisoned())?;
        retrieval::full_resonate(
            &self.store,
            &indices,
            self.embedder.as_ref(),
            &self.feedback,
            Some(&session),
            query_text,
            limit,
            spread_strength,
            hebbian_strength,
            exclude_tags,
        )
    }

    pub fn ppr_query(&self, query_text: &str, k: usize, epsilon: f32) -> Result<Vec<(NodeId, f32)>> {
        let query = self
            .embedder
            .embed(query_text)
            .map_err(|e| MemonicError::EmbedderUnavailable(e.to_string()))?;
        let indices = self.indices.read().map_err(|_| Self::lock_poisoned())?;
        Ok(graph::ppr_query(&self.store, &indices, &query, k, epsilon)?)
    }

    pub fn hawkes_timeline(&self, hours: f64, limit: usize) -> Result<Vec<(NodeId, f64)>> {
        Ok(graph::hawkes_timeline(&self.store, hours, limit)?)
    }

    pub fn find_causal_chains(
        &self,
        effect_id: NodeId,
        max_depth: usize,
        min_confidence: f32,
    ) -> Result<Vec<graph::CausalChain>> {
        let indices = self.indices.read().map_err(|_| Self::lock_poisoned())?;
        Ok(graph::find_causal_chains(&self.store, &indices, effect_id, max_depth, min_confidence)?)
    }

    pub fn lsh_find_similar(&self, vector: &Vector, _k: usize) -> Result<Vec<NodeId>> {
        let indices = self.indices.read().map_err(|_| Self::lock_poisoned())?;
        Ok(graph::lsh_find_similar(&indices, vector, _k))
    }

    pub fn forget(&self, id: NodeId, cascade: bool, rewire: bool, cascade_strength: f32) -> Result<()> {
        let mut indices = self.indices.write().map_err(|_| Self::lock_poisoned())?;
        retrieval::forget(&self.store, &mut indices, id, cascade, rewire, cascade_strength)
    }

    // -- feedback -------------------------------------------------------------

    pub fn record_feedback(&self, id: NodeId, kind: FeedbackKind, magnitude: f32) {
        self.feedback.push(FeedbackEvent::new(id, kind, magnitude));
    }

    // -- session context --------------------------------------------------

    pub fn set_intentions(&self, intentions: Vec<String>) -> Result<()> {
        self.session.write().map_err(|_| Self::lock_poisoned())?.set_intentions(intentions);
        Ok(())
    }

    pub fn observe_context(&self, text: String) -> Result<()> {
        self.session.write().map_err(|_| Self::lock_poisoned())?.observe(text);
        Ok(())
    }

    // -- entity linking (§9(c) realm scoping is on `Provenance`; entity
    //    linking is the §3 bridge between triplet text and stored content) --

    pub fn entity_link(&self, name: String, node_id: NodeId) -> Result<()> {
        if self.store.get(&node_id)?.is_none() {
            return Err(MemonicError::NotFound(node_id.to_string_hex()));
        }
        self.entities
            .write()
            .map_err(|_| Self::lock_poisoned())?
            .insert(name, node_id);
        Ok(())
    }

    pub fn entity_resolve(&self, name: &str) -> Result<Option<NodeId>> {
        Ok(self.entities.read().map_err(|_| Self::lock_poisoned())?.get(name).copied())
    }

    // -- ledgers ------------------------------------------------------------

    /// Saves a named, timestamped session summary as an Episode node
    /// (§3 "Ledger") and records it in the in-memory ledger list.
    pub fn ledger_save(&self, name: String, summary: String) -> Result<NodeId> {
        let mut tags = HashSet::new();
        tags.insert("ledger".to_string());
        let id = self.remember(NodeKind::Episode, summary, None, tags, None)?;
        let node = self.store.get(&id)?.expect("just-saved ledger node must exist");
        self.ledgers.write().map_err(|_| Self::lock_poisoned())?.push(LedgerEntry {
            name,
            node_id: id,
            tau_created: node.tau_created,
        });
        Ok(id)
    }

    pub fn ledger_load(&self, name: &str) -> Result<Option<Node>> {
        let node_id = {
            let ledgers = self.ledgers.read().map_err(|_| Self::lock_poisoned())?;
            ledgers.iter().rev().find(|l| l.name == name).map(|l| l.node_id)
        };
        match node_id {
            Some(id) => Ok(self.store.get(&id)?),
            None => Ok(None),
        }
    }

    pub fn ledger_list(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.ledgers.read().map_err(|_| Self::lock_poisoned())?.clone())
    }

    // -- dynamics / health ----------------------------------------------------

    /// Runs exactly one dynamics cycle synchronously (used by the CLI's
    /// explicit maintenance command and by tests; the daemon otherwise drives
    /// this from a background [`crate::dynamics::Scheduler`]).
    pub fn run_cycle(&self, do_checkpoint: bool) -> Result<CycleReport> {
        let mut indices = self.indices.write().map_err(|_| Self::lock_poisoned())?;
        Ok(dynamics::run_cycle(
            &self.store,
            &mut indices,
            &self.feedback,
            self.summarizer.as_ref(),
            self.config.decay_interval_ms,
            self.config.prune_threshold,
            self.config.skip_bm25,
            do_checkpoint,
        )?)
    }

    pub fn health(&self, stale_after_ms: i64) -> Result<HealthScore> {
        let indices = self.indices.read().map_err(|_| Self::lock_poisoned())?;
        Ok(health::compute_health(
            &self.store,
            &indices,
            self.config.hot_capacity,
            self.config.warm_capacity,
            stale_after_ms,
        )?)
    }

    pub fn run_recovery(&self) -> Result<RecoveryReport> {
        let mut indices = self.indices.write().map_err(|_| Self::lock_poisoned())?;
        Ok(health::run_recovery(&self.store, &mut indices, self.config.skip_bm25)?)
    }

    pub fn checkpoint(&self) -> Result<()> {
        Ok(self.store.checkpoint()?)
    }

    pub fn stats(&self) -> Result<MemoryStats> {
        let nodes = self.store.all_nodes()?;
        let indices = self.indices.read().map_err(|_| Self::lock_poisoned())?;
        let total_edges: usize = nodes.iter().map(|n| n.edges.len()).sum();
        Ok(MemoryStats {
            total_nodes: nodes.len(),
            hot_nodes: self.store.hot_count(),
            warm_nodes: self.store.warm_count()?,
            cold_nodes: self.store.cold_count()?,
            total_edges,
            yantra_ready: !indices.ann.is_empty() || nodes.iter().all(|n| !n.has_embedding),
        })
    }

    pub fn embedding_dim(&self) -> usize {
        self.store.embedding_dim()
    }

    pub fn is_emergency(&self) -> bool {
        self.store.is_emergency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine() -> (TempDir, MemoryEngine) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.store_path = dir.path().join("store");
        config.decay_interval_ms = 1_000;
        let engine = MemoryEngine::open_without_embeddings(config, 8).unwrap();
        (dir, engine)
    }

    #[test]
    fn remember_then_get_roundtrips_payload() {
        let (_dir, e) = engine();
        let id = e.remember(NodeKind::Episode, "hello world".into(), None, HashSet::new(), None).unwrap();
        let node = e.get(&id).unwrap().unwrap();
        assert_eq!(node.text.as_deref(), Some("hello world"));
        assert_eq!(node.kind, NodeKind::Episode);
    }

    #[test]
    fn connect_rejects_missing_endpoints() {
        let (_dir, e) = engine();
        let a = e.remember(NodeKind::Episode, "a".into(), None, HashSet::new(), None).unwrap();
        let ghost = NodeId::new();
        assert!(e.connect(&a, &ghost, EdgeType::Related, 0.5).is_err());
        assert!(e.get(&a).unwrap().unwrap().edges.is_empty());
    }

    #[test]
    fn empty_store_recall_returns_nothing() {
        let (_dir, e) = engine();
        let results = e
            .recall("anything", 5, 0.0, SearchMode::Hybrid, Zoom::Normal, None, false, false, false)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn entity_link_rejects_unknown_node() {
        let (_dir, e) = engine();
        assert!(e.entity_link("widget".into(), NodeId::new()).is_err());
    }

    #[test]
    fn ledger_save_then_load_roundtrips() {
        let (_dir, e) = engine();
        e.ledger_save("session-1".into(), "did some work".into()).unwrap();
        let node = e.ledger_load("session-1").unwrap().unwrap();
        assert_eq!(node.text.as_deref(), Some("did some work"));
        assert!(e.ledger_load("missing").unwrap().is_none());
    }

    #[test]
    fn forget_removes_node_and_edges() {
        let (_dir, e) = engine();
        let a = e.remember(NodeKind::Episode, "a".into(), None, HashSet::new(), None).unwrap();
        let b = e.remember(NodeKind::Episode, "b".into(), None, HashSet::new(), None).unwrap();
        e.connect(&a, &b, EdgeType::Related, 0.5).unwrap();
        e.forget(b, false, false, 0.0).unwrap();
        assert!(e.get(&b).unwrap().is_none());
        assert!(e.get(&a).unwrap().unwrap().edges.is_empty());
    }
}
