//! BM25-style inverted index over token streams derived from decoded node
//! text. Entirely optional — the `skip_bm25` config flag lets a deployment
//! skip building and querying it when lexical search isn't needed.

use std::collections::HashMap;

use crate::id::NodeId;

const K1: f32 = 1.2;
const B: f32 = 0.75;

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

#[derive(Default)]
pub struct LexicalIndex {
    /// term -> (doc id -> term frequency)
    postings: HashMap<String, HashMap<NodeId, u32>>,
    doc_lengths: HashMap<NodeId, u32>,
    total_doc_length: u64,
    doc_count: usize,
}

impl LexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&mut self, id: NodeId, text: &str) {
        self.remove(&id);
        let tokens = tokenize(text);
        let len = tokens.len() as u32;
        if len == 0 {
            return;
        }
        let mut freqs: HashMap<String, u32> = HashMap::new();
        for t in tokens {
            *freqs.entry(t).or_insert(0) += 1;
        }
        for (term, freq) in freqs {
            self.postings.entry(term).or_default().insert(id, freq);
        }
        self.doc_lengths.insert(id, len);
        self.total_doc_length += len as u64;
        self.doc_count += 1;
    }

    pub fn remove(&mut self, id: &NodeId) {
        if let Some(len) = self.doc_lengths.remove(id) {
            self.total_doc_length = self.total_doc_length.saturating_sub(len as u64);
            self.doc_count = self.doc_count.saturating_sub(1);
        }
        self.postings.retain(|_, docs| {
            docs.remove(id);
            !docs.is_empty()
        });
    }

    pub fn len(&self) -> usize {
        self.doc_count
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }

    fn avg_doc_length(&self) -> f32 {
        if self.doc_count == 0 {
            0.0
        } else {
            self.total_doc_length as f32 / self.doc_count as f32
        }
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.doc_count as f32;
        let df = self.postings.get(term).map(|d| d.len()).unwrap_or(0) as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Returns up to `k` `(id, score)` pairs, descending by BM25 score.
    pub fn search(&self, query: &str, k: usize) -> Vec<(NodeId, f32)> {
        if self.doc_count == 0 {
            return Vec::new();
        }
        let avg_len = self.avg_doc_length();
        let terms = tokenize(query);
        let mut scores: HashMap<NodeId, f32> = HashMap::new();

        for term in &terms {
            let Some(docs) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(term);
            for (&id, &tf) in docs {
                let doc_len = *self.doc_lengths.get(&id).unwrap_or(&1) as f32;
                let tf = tf as f32;
                let denom = tf + K1 * (1.0 - B + B * doc_len / avg_len.max(1.0));
                let score = idf * (tf * (K1 + 1.0)) / denom.max(f32::EPSILON);
                *scores.entry(id).or_insert(0.0) += score;
            }
        }

        let mut ranked: Vec<(NodeId, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_term_match_outranks_unrelated_doc() {
        let mut idx = LexicalIndex::new();
        let a = NodeId::new();
        let b = NodeId::new();
        idx.index(a, "always validate inputs before use");
        idx.index(b, "ci runs the full test suite nightly");

        let results = idx.search("validate input", 5);
        assert_eq!(results[0].0, a);
    }

    #[test]
    fn removed_doc_no_longer_matches() {
        let mut idx = LexicalIndex::new();
        let a = NodeId::new();
        idx.index(a, "rust ownership and borrowing");
        idx.remove(&a);
        assert!(idx.search("rust", 5).is_empty());
    }

    #[test]
    fn empty_index_returns_no_results() {
        let idx = LexicalIndex::new();
        assert!(idx.search("anything", 5).is_empty());
    }

    #[test]
    fn reindexing_same_id_replaces_terms() {
        let mut idx = LexicalIndex::new();
        let a = NodeId::new();
        idx.index(a, "rust");
        idx.index(a, "golang");
        assert!(idx.search("rust", 5).is_empty());
        assert_eq!(idx.search("golang", 5)[0].0, a);
    }
}
