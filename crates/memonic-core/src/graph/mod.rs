//! Graph algorithms layered over the reverse-edge index and LSH buckets:
//! personalized PageRank, recency timelines, causal chain discovery, and
//! near-duplicate consolidation.

mod causal;
mod consolidation;
mod hawkes;
mod ppr;

pub use causal::{find_causal_chains, CausalChain};
pub use consolidation::{find_near_duplicates, lsh_find_similar, DuplicatePair, CONSOLIDATION_MIN_COSINE};
pub use hawkes::hawkes_timeline;
pub use ppr::ppr_query;
