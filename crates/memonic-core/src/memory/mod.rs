//! The node/edge data model: records as owned by the tiered store, plus the
//! Gaussian confidence posterior attached to each node.

mod confidence;
mod edge;
mod node;

pub use confidence::{Confidence, MAX_EVIDENCE_COUNT, PRIOR_SIGMA2};
pub use edge::{Edge, EdgeType};
pub use node::{Node, NodeKind, Provenance, RememberInput, Tier, DEFAULT_DELTA};

/// Aggregate counters reported by `stats`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MemoryStats {
    pub total_nodes: usize,
    pub hot_nodes: usize,
    pub warm_nodes: usize,
    pub cold_nodes: usize,
    pub total_edges: usize,
    /// True when embeddings and the ANN index are usable for semantic
    /// search (the spec's "yantra-ready" state).
    pub yantra_ready: bool,
}
