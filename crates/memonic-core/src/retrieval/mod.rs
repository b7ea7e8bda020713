//! Retrieval: turning a query into ranked, feedback-instrumented results.
//!
//! Dense ANN search and sparse BM25 search are fused with reciprocal rank
//! fusion, then narrowed by tag filters, widened by priming and spreading
//! activation, and sharpened by lateral inhibition — in that order, matching
//! the retrieval pipeline laid out module-by-module below.

mod fusion;
mod inhibition;
mod pipeline;
mod priming;
mod spreading;
mod types;

pub use fusion::{reciprocal_rank_fusion, RRF_K0};
pub use inhibition::{apply_lateral_inhibition, INHIBITION_STRENGTH, SIMILARITY_THRESHOLD, SUPPRESSION_FLOOR};
pub use pipeline::{forget, full_resonate, recall, resonate};
pub use priming::{priming_boost, MAX_PRIMING_BOOST};
pub use spreading::{spread_activation, HOP_DECAY, MAX_DEPTH, SEED_COUNT};
pub use types::{Recall, RecallOptions, SearchMode, Zoom};
