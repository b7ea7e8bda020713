//! The `recall`/`resonate`/`full_resonate` retrieval pipeline: dense +
//! sparse + hybrid search, tag filtering, priming, spreading activation,
//! lateral inhibition, and the Hebbian co-activation update that closes the
//! loop between retrieval and the graph.

use std::collections::HashMap;

use crate::external::Embedder;
use crate::id::NodeId;
use crate::index::Indices;
use crate::memory::EdgeType;
use crate::session::SessionContext;
use crate::storage::TieredStore;
use crate::vector::Vector;

use super::fusion::reciprocal_rank_fusion;
use super::inhibition::apply_lateral_inhibition;
use super::priming::priming_boost;
use super::spreading::{spread_activation, SEED_COUNT};
use super::types::{Recall, RecallOptions, SearchMode};
use crate::dynamics::feedback::{FeedbackEvent, FeedbackKind, FeedbackQueue};
use crate::error::{MemonicError, Result};

/// The shared implementation behind `recall`, `resonate`, and
/// `full_resonate` — those three differ only in which stages of the pipeline
/// are enabled, expressed entirely through [`RecallOptions`].
#[allow(clippy::too_many_arguments)]
pub fn recall(
    store: &TieredStore,
    indices: &Indices,
    embedder: &dyn Embedder,
    feedback: &FeedbackQueue,
    session: Option<&SessionContext>,
    query_text: &str,
    opts: &RecallOptions,
) -> Result<Vec<Recall>> {
    let k = (opts.limit * opts.zoom.fanout()).max(opts.limit);

    let query_vector: Option<Vector> = embedder.embed(query_text).ok();

    let dense: Vec<(NodeId, f32)> = match (&query_vector, opts.mode) {
        (Some(qv), SearchMode::Dense | SearchMode::Hybrid) => {
            indices.ann.search_with_threshold(qv, k, 0.0)?
        }
        _ => Vec::new(),
    };

    let sparse: Vec<(NodeId, f32)> = match opts.mode {
        SearchMode::Sparse | SearchMode::Hybrid => indices.lexical.search(query_text, k),
        SearchMode::Dense => Vec::new(),
    };

    let mut relevance: HashMap<NodeId, f32> = match opts.mode {
        SearchMode::Hybrid => reciprocal_rank_fusion(&[&dense, &sparse]).into_iter().collect(),
        SearchMode::Dense => normalize_scores(&dense),
        SearchMode::Sparse => normalize_scores(&sparse),
    };

    if let Some(tag) = &opts.tag {
        let allowed = indices.tag.find(tag);
        let allowed: std::collections::HashSet<NodeId> = allowed.into_iter().collect();
        relevance.retain(|id, _| allowed.contains(id));
    }
    if !opts.exclude_tags.is_empty() {
        relevance.retain(|id, _| {
            store
                .get(id)
                .ok()
                .flatten()
                .map(|n| !n.tags.iter().any(|t| opts.exclude_tags.contains(t)))
                .unwrap_or(false)
        });
    }

    if opts.primed {
        if let (Some(session), Some(qv)) = (session, &query_vector) {
            let _ = qv;
            if let Some(basin) = session.goal_basin(embedder) {
                for (id, rel) in relevance.iter_mut() {
                    if let Ok(Some(node)) = store.get(id) {
                        if node.has_embedding {
                            *rel += priming_boost(&node.embedding, &basin);
                        }
                    }
                }
            }
        }
    }

    if opts.spread_strength > 0.0 {
        let mut seeds: Vec<(NodeId, f32)> = relevance.iter().map(|(id, r)| (*id, *r)).collect();
        seeds.sort_by(|a, b| b.1.total_cmp(&a.1));
        seeds.truncate(SEED_COUNT);
        let activation = spread_activation(&seeds, |id| store.get(id).ok().flatten());
        for (id, energy) in activation {
            *relevance.entry(id).or_insert(0.0) += energy * opts.spread_strength;
        }
    }

    let mut ranked: Vec<(NodeId, f32)> = relevance.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    if opts.compete {
        let mut with_vectors: Vec<(NodeId, Vector, f32)> = ranked
            .iter()
            .filter_map(|(id, rel)| {
                store.get(id).ok().flatten().and_then(|n| {
                    if n.has_embedding {
                        Some((*id, n.embedding, *rel))
                    } else {
                        None
                    }
                })
            })
            .collect();
        apply_lateral_inhibition(&mut with_vectors, false);
        let adjusted: HashMap<NodeId, f32> =
            with_vectors.into_iter().map(|(id, _, rel)| (id, rel)).collect();
        for (id, rel) in ranked.iter_mut() {
            if let Some(new_rel) = adjusted.get(id) {
                *rel = *new_rel;
            }
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    }

    ranked.retain(|(_, rel)| *rel >= opts.threshold);
    ranked.truncate(opts.limit);

    let mut results = Vec::with_capacity(ranked.len());
    for (id, relevance) in &ranked {
        let Some(node) = store.get(id)? else { continue };
        results.push(Recall {
            id: *id,
            relevance: *relevance,
            node,
        });
    }

    // tau_accessed updates and the Used feedback event happen after scoring
    // is complete, so a retrieval never primes itself mid-request.
    for result in &results {
        store.mark_accessed(&result.id)?;
        feedback.push(FeedbackEvent::new(result.id, FeedbackKind::Used, 1.0));
    }

    if opts.learn {
        hebbian_update(store, &results, opts.hebbian_strength)?;
    }

    Ok(results)
}

/// Strengthens (or creates) a Hebbian edge between every pair among the
/// first `min(5, len(results))` returned results.
fn hebbian_update(store: &TieredStore, results: &[Recall], hebbian_strength: f32) -> Result<()> {
    let n = results.len().min(5);
    for i in 0..n {
        for j in (i + 1)..n {
            store.hebbian_strengthen(&results[i].id, &results[j].id, hebbian_strength)?;
            store.hebbian_strengthen(&results[j].id, &results[i].id, hebbian_strength)?;
        }
    }
    Ok(())
}

fn normalize_scores(scored: &[(NodeId, f32)]) -> HashMap<NodeId, f32> {
    let max = scored.iter().map(|(_, s)| *s).fold(f32::MIN, f32::max).max(1e-6);
    scored.iter().map(|(id, s)| (*id, (s / max).max(0.0))).collect()
}

/// `resonate`: `recall` with priming off, spreading strength exposed.
pub fn resonate(
    store: &TieredStore,
    indices: &Indices,
    embedder: &dyn Embedder,
    feedback: &FeedbackQueue,
    query_text: &str,
    limit: usize,
    spread_strength: f32,
    learn: bool,
    hebbian_strength: f32,
) -> Result<Vec<Recall>> {
    let opts = RecallOptions {
        limit,
        primed: false,
        spread_strength,
        learn,
        hebbian_strength,
        ..RecallOptions::default()
    };
    recall(store, indices, embedder, feedback, None, query_text, &opts)
}

/// `full_resonate`: priming + spreading + lateral inhibition + Hebbian,
/// filtered to exclude any result whose tags intersect `exclude_tags`.
#[allow(clippy::too_many_arguments)]
pub fn full_resonate(
    store: &TieredStore,
    indices: &Indices,
    embedder: &dyn Embedder,
    feedback: &FeedbackQueue,
    session: Option<&SessionContext>,
    query_text: &str,
    limit: usize,
    spread_strength: f32,
    hebbian_strength: f32,
    exclude_tags: Vec<String>,
) -> Result<Vec<Recall>> {
    let opts = RecallOptions {
        limit,
        primed: true,
        compete: true,
        learn: true,
        spread_strength,
        hebbian_strength,
        exclude_tags,
        ..RecallOptions::default()
    };
    recall(store, indices, embedder, feedback, session, query_text, &opts)
}

/// `forget(id, cascade, rewire, cascade_strength)`: collects neighbors before
/// the node disappears, optionally dampens their confidence and rewires
/// around the gap, then removes the node and writes an audit episode.
pub fn forget(
    store: &TieredStore,
    indices: &mut Indices,
    id: NodeId,
    cascade: bool,
    rewire: bool,
    cascade_strength: f32,
) -> Result<()> {
    let Some(node) = store.get(&id)? else {
        return Err(MemonicError::NotFound(id.to_string_hex()));
    };

    let outbound: Vec<NodeId> = node.edges.iter().map(|e| e.target).collect();
    let inbound: Vec<NodeId> = indices
        .reverse_edge
        .incoming(&id)
        .iter()
        .map(|e| e.source)
        .collect();

    if cascade {
        for neighbor in inbound.iter().chain(outbound.iter()) {
            store.apply_confidence_evidence(neighbor, -cascade_strength)?;
        }
    }

    if rewire {
        for &src in &inbound {
            for &dst in &outbound {
                if src != dst {
                    store.connect(&src, &dst, EdgeType::Hebbian, 0.1)?;
                    indices.reindex_edge(src, dst, EdgeType::Hebbian, 0.1);
                }
            }
        }
    }

    indices.remove_node(&id);
    store.forget(&id)?;

    let audit_text = format!(
        "forgot node {} (cascade={cascade}, rewire={rewire}, inbound={}, outbound={})",
        id.to_string_hex(),
        inbound.len(),
        outbound.len()
    );
    store.remember(
        crate::memory::NodeKind::Episode,
        audit_text.clone().into_bytes(),
        Some(audit_text),
        None,
        std::collections::HashSet::from(["audit".to_string(), "forget".to_string()]),
        None,
    )?;

    Ok(())
}
