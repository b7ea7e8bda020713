//! Wisdom synthesis: detect clusters of mutually-similar, commonly-tagged
//! nodes and fold them into a single `Wisdom` node via an externally
//! supplied [`Summarizer`] strategy. Core assembles the inputs; it never
//! decides what the synthesized text says.

use std::collections::{HashSet, VecDeque};

use crate::external::Summarizer;
use crate::id::NodeId;
use crate::index::Indices;
use crate::memory::{EdgeType, Node, NodeKind};
use crate::storage::TieredStore;

use crate::error::Result;

/// Minimum cluster size before it's worth synthesizing.
pub const MIN_CLUSTER_SIZE: usize = 3;
/// Minimum mutual cosine similarity for two nodes to be considered
/// co-clustered.
pub const MIN_MUTUAL_COSINE: f32 = 0.85;

/// Finds clusters of `>= MIN_CLUSTER_SIZE` synthesizable nodes that share at
/// least one tag and are pairwise similar above [`MIN_MUTUAL_COSINE`], then
/// writes one `Wisdom` node per cluster summarizing it.
pub fn synthesize_wisdom(
    store: &TieredStore,
    indices: &mut Indices,
    summarizer: &dyn Summarizer,
    skip_bm25: bool,
) -> Result<usize> {
    let nodes = store.all_nodes()?;
    let candidates: Vec<&Node> = nodes
        .iter()
        .filter(|n| n.kind.is_synthesizable() && n.has_embedding && !n.tags.is_empty())
        .collect();

    let clusters = find_clusters(&candidates);
    let mut synthesized = 0usize;

    for cluster in clusters {
        let members: Vec<&Node> = cluster.iter().map(|idx| candidates[*idx]).collect();
        let texts: Vec<String> = members
            .iter()
            .filter_map(|n| n.text.clone())
            .collect();
        if texts.is_empty() {
            continue;
        }
        let summary = summarizer.summarize(&texts);
        let shared_tags: HashSet<String> = members
            .iter()
            .fold(None, |acc: Option<HashSet<String>>, n| {
                Some(match acc {
                    Some(prev) => prev.intersection(&n.tags).cloned().collect(),
                    None => n.tags.clone(),
                })
            })
            .unwrap_or_default();

        let wisdom_id = store.remember(
            NodeKind::Wisdom,
            summary.clone().into_bytes(),
            Some(summary),
            None,
            shared_tags,
            None,
        )?;
        if let Some(node) = store.get(&wisdom_id)? {
            indices.index_node(&node, skip_bm25);
        }
        for member in &members {
            store.connect(&wisdom_id, &member.id, EdgeType::Related, 0.5)?;
            indices.reindex_edge(wisdom_id, member.id, EdgeType::Related, 0.5);
        }
        synthesized += 1;
    }

    Ok(synthesized)
}

/// Connected components (by shared tag + mutual cosine above threshold)
/// among `candidates`, returned as index sets into `candidates`, filtered to
/// `>= MIN_CLUSTER_SIZE`.
fn find_clusters(candidates: &[&Node]) -> Vec<Vec<usize>> {
    let n = candidates.len();
    let mut adjacency = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if !candidates[i].tags.is_disjoint(&candidates[j].tags)
                && candidates[i].embedding.cosine(&candidates[j].embedding) >= MIN_MUTUAL_COSINE
            {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }

    let mut visited = vec![false; n];
    let mut clusters = Vec::new();
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(idx) = queue.pop_front() {
            component.push(idx);
            for &next in &adjacency[idx] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        if component.len() >= MIN_CLUSTER_SIZE {
            clusters.push(component);
        }
    }
    clusters
}
