//! Locality-sensitive hashing for near-duplicate detection. Random
//! hyperplane signatures turn cosine similarity into Hamming distance on a
//! bitset, so consolidation can find merge candidates without scanning
//! every pair of embeddings.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::id::NodeId;
use crate::vector::Vector;

const DEFAULT_BITS: usize = 64;

pub struct LshIndex {
    hyperplanes: Vec<Vec<f32>>,
    buckets: HashMap<u64, Vec<NodeId>>,
    signatures: HashMap<NodeId, u64>,
}

impl LshIndex {
    /// `seed` is fixed so signatures are reproducible across process
    /// restarts for the same dimension — a different seed would silently
    /// invalidate every existing bucket.
    pub fn new(dimensions: usize, seed: u64) -> Self {
        Self::with_bits(dimensions, seed, DEFAULT_BITS)
    }

    pub fn with_bits(dimensions: usize, seed: u64, bits: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let hyperplanes = (0..bits)
            .map(|_| (0..dimensions).map(|_| rng.gen_range(-1.0f32..1.0f32)).collect())
            .collect();
        LshIndex {
            hyperplanes,
            buckets: HashMap::new(),
            signatures: HashMap::new(),
        }
    }

    fn signature(&self, vector: &Vector) -> u64 {
        let mut sig: u64 = 0;
        for (i, plane) in self.hyperplanes.iter().enumerate() {
            let dot: f32 = plane.iter().zip(vector.0.iter()).map(|(a, b)| a * b).sum();
            if dot >= 0.0 {
                sig |= 1 << i;
            }
        }
        sig
    }

    pub fn insert(&mut self, id: NodeId, vector: &Vector) {
        self.remove(&id);
        let sig = self.signature(vector);
        self.buckets.entry(sig).or_default().push(id);
        self.signatures.insert(id, sig);
    }

    pub fn remove(&mut self, id: &NodeId) {
        if let Some(sig) = self.signatures.remove(id) {
            if let Some(bucket) = self.buckets.get_mut(&sig) {
                bucket.retain(|x| x != id);
                if bucket.is_empty() {
                    self.buckets.remove(&sig);
                }
            }
        }
    }

    /// Other ids sharing this node's exact bucket — cheap candidate set,
    /// not a ranked result; callers re-score with real cosine similarity.
    pub fn candidates(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(sig) = self.signatures.get(id) else {
            return Vec::new();
        };
        self.buckets
            .get(sig)
            .map(|b| b.iter().filter(|x| *x != id).copied().collect())
            .unwrap_or_default()
    }

    /// Candidates within `max_hamming` bits of `vector`'s signature, for
    /// looser recall than exact-bucket matching.
    pub fn candidates_within(&self, vector: &Vector, max_hamming: u32) -> Vec<NodeId> {
        let query_sig = self.signature(vector);
        let mut found = Vec::new();
        for (sig, ids) in &self.buckets {
            if (sig ^ query_sig).count_ones() <= max_hamming {
                found.extend(ids.iter().copied());
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(dim: usize, vals: &[f32]) -> Vector {
        let mut data = vals.to_vec();
        data.resize(dim, 0.0);
        Vector(data)
    }

    #[test]
    fn identical_vectors_share_a_bucket() {
        let mut idx = LshIndex::new(8, 42);
        let a = NodeId::new();
        let b = NodeId::new();
        let vec = v(8, &[1.0, 0.5, -0.3, 0.2, 0.1, -0.7, 0.4, 0.9]);
        idx.insert(a, &vec);
        idx.insert(b, &vec);
        assert!(idx.candidates(&a).contains(&b));
    }

    #[test]
    fn opposite_vectors_usually_diverge() {
        let mut idx = LshIndex::new(16, 7);
        let a = NodeId::new();
        let b = NodeId::new();
        let vec = v(16, &[1.0; 16]);
        let opposite = v(16, &[-1.0; 16]);
        idx.insert(a, &vec);
        idx.insert(b, &opposite);
        assert!(!idx.candidates(&a).contains(&b));
    }

    #[test]
    fn remove_drops_membership() {
        let mut idx = LshIndex::new(8, 1);
        let a = NodeId::new();
        idx.insert(a, &v(8, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]));
        idx.remove(&a);
        assert!(idx.is_empty());
    }

    #[test]
    fn reinserting_same_id_updates_bucket() {
        let mut idx = LshIndex::new(8, 3);
        let a = NodeId::new();
        idx.insert(a, &v(8, &[1.0; 8]));
        idx.insert(a, &v(8, &[-1.0; 8]));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn candidates_within_includes_exact_bucket() {
        let mut idx = LshIndex::new(8, 9);
        let a = NodeId::new();
        let b = NodeId::new();
        let vec = v(8, &[1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0]);
        idx.insert(a, &vec);
        idx.insert(b, &vec);
        let found = idx.candidates_within(&vec, 0);
        assert!(found.contains(&a) && found.contains(&b));
    }
}
