//! # memonic-core
//!
//! Long-running semantic memory substrate for an AI coding assistant: tiered
//! node/edge storage with persistence and crash recovery, a hybrid
//! dense/sparse/graph-augmented retrieval pipeline, and background dynamics
//! (confidence decay, feedback application, attractor settling, wisdom
//! synthesis, health accounting) that keep a node's confidence converging
//! between requests rather than needing an explicit caller to drive every
//! step.
//!
//! This crate is the engine only — the embedding model, the tree-sitter
//! symbol extractor, and the JSON-RPC tool surface are external
//! collaborators whose minimal contracts live in [`external`]; a concrete
//! wiring of all three together lives in the `memonic-daemon` binary.
//!
//! ## Layout
//!
//! - [`vector`] — fixed-dimension dense vectors and int8 quantization.
//! - [`id`] / [`time`] — 128-bit node identifiers and monotonic millisecond
//!   time.
//! - [`memory`] — the node/edge data model and the confidence posterior.
//! - [`storage`] — the tiered (Hot/Warm/Cold) store, WAL, and snapshots.
//! - [`index`] — ANN, lexical (BM25), tag, reverse-edge, and LSH indices.
//! - [`retrieval`] — `recall`/`resonate`/`full_resonate`/`forget`.
//! - [`dynamics`] — the background decay/feedback/wisdom/attractor/prune
//!   cycle and its scheduler thread.
//! - [`graph`] — personalized PageRank, Hawkes timelines, causal chains,
//!   LSH-based near-duplicate consolidation.
//! - [`health`] — the `ojas` composite score and integrity recovery.
//! - [`session`] — session context (intentions, recent observations, goal
//!   basin) that primes retrieval.
//! - [`external`] — the `Embedder`/`SymbolExtractor`/`Summarizer` capability
//!   traits this crate consumes but never implements.
//! - [`engine`] — [`engine::MemoryEngine`], the facade bundling all of the
//!   above into the typed operations a dispatcher wraps.
//! - [`config`] — environment-driven runtime configuration.
//! - [`error`] — the crate-wide error type.

pub mod config;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod external;
pub mod graph;
pub mod health;
pub mod id;
pub mod index;
pub mod memory;
pub mod retrieval;
pub mod session;
pub mod storage;
pub mod time;
pub mod vector;

pub use config::Config;
pub use engine::{LedgerEntry, MemoryEngine};
pub use error::{MemonicError, Result};
pub use external::{EmbedError, Embedder, NaiveSummarizer, NullEmbedder, NullSymbolExtractor, SourceSpan, Summarizer, Symbol, SymbolExtractor};
pub use health::{HealthScore, HealthStatus, RecoveryReport};
pub use id::NodeId;
pub use memory::{Confidence, Edge, EdgeType, MemoryStats, Node, NodeKind, Provenance, Tier};
pub use retrieval::{Recall, RecallOptions, SearchMode, Zoom};
pub use vector::{QuantizedVector, Vector};

/// Crate version, re-exported for `stats`/introspection responses.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common usage from the daemon or a test harness.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dynamics::feedback::FeedbackKind;
    pub use crate::engine::{LedgerEntry, MemoryEngine};
    pub use crate::error::{MemonicError, Result};
    pub use crate::external::{Embedder, NullEmbedder, SymbolExtractor, Summarizer};
    pub use crate::health::{HealthScore, HealthStatus};
    pub use crate::id::NodeId;
    pub use crate::memory::{EdgeType, Node, NodeKind, Provenance};
    pub use crate::retrieval::{Recall, SearchMode, Zoom};
    pub use crate::vector::Vector;
}
