//! In-memory query indices layered over the tiered store: dense ANN search,
//! sparse lexical search, tag bitmaps, reverse-edge lookups, and LSH
//! near-duplicate buckets. None of these are durable on their own — they are
//! rebuilt from the store's nodes on startup.

mod ann;
mod lexical;
mod lsh;
mod reverse_edge;
mod tag_index;

pub use ann::{AnnConfig, AnnError, AnnIndex, AnnStats};
pub use lexical::LexicalIndex;
pub use lsh::LshIndex;
pub use reverse_edge::{IncomingEdge, ReverseEdgeIndex};
pub use tag_index::TagIndex;

use thiserror::Error;

use crate::id::NodeId;
use crate::memory::{EdgeType, Node};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IndexError {
    #[error(transparent)]
    Ann(#[from] AnnError),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// Every rebuildable index, bundled together. None of this is durable on its
/// own — [`Indices::rebuild`] reconstructs it from the authoritative node set
/// the tiered store holds, which is what `health()` calls when an individual
/// index fails its consistency check.
pub struct Indices {
    pub ann: AnnIndex,
    pub lexical: LexicalIndex,
    pub tag: TagIndex,
    pub reverse_edge: ReverseEdgeIndex,
    pub lsh: LshIndex,
}

impl Indices {
    pub fn new(dimensions: usize, lsh_seed: u64) -> Result<Self> {
        Ok(Indices {
            ann: AnnIndex::new(dimensions)?,
            lexical: LexicalIndex::new(),
            tag: TagIndex::new(),
            reverse_edge: ReverseEdgeIndex::new(),
            lsh: LshIndex::new(dimensions, lsh_seed),
        })
    }

    /// Indexes one freshly-created or freshly-loaded node into every index.
    pub fn index_node(&mut self, node: &Node, skip_bm25: bool) {
        if node.has_embedding {
            let _ = self.ann.add(node.id, &node.embedding);
            self.lsh.insert(node.id, &node.embedding);
        }
        if !skip_bm25 {
            if let Some(text) = &node.text {
                self.lexical.index(node.id, text);
            }
        }
        for tag in &node.tags {
            self.tag.add_tag(node.id, tag);
        }
        for edge in &node.edges {
            self.reverse_edge
                .add(node.id, edge.target, edge.edge_type, edge.weight);
        }
    }

    pub fn remove_node(&mut self, id: &NodeId) {
        let _ = self.ann.remove(id);
        self.lsh.remove(id);
        self.lexical.remove(id);
        self.tag.remove_node(id);
        self.reverse_edge.remove_target(id);
        self.reverse_edge.remove_source(id);
    }

    /// Drops every entry and re-derives from `nodes` — the authoritative
    /// source of truth. Used at startup and by `health()`'s repair path.
    pub fn rebuild(&mut self, nodes: &[Node], skip_bm25: bool) {
        *self = Indices::new(self.ann.dimensions().max(1), 0x5bd1e995).unwrap_or_else(|_| {
            panic!("rebuilding indices with a previously-valid dimension should not fail")
        });
        for node in nodes {
            self.index_node(node, skip_bm25);
        }
    }

    pub fn cardinality_matches(&self, node_count: usize) -> bool {
        self.ann.len() <= node_count
    }

    pub fn reindex_edge(&mut self, source: NodeId, target: NodeId, edge_type: EdgeType, weight: f32) {
        self.reverse_edge.add(source, target, edge_type, weight);
    }

    pub fn unindex_edge(&mut self, source: &NodeId, target: &NodeId, edge_type: EdgeType) {
        self.reverse_edge.remove_edge(source, target, edge_type);
    }
}
