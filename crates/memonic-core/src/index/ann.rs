//! Approximate nearest-neighbor index over node embeddings, backed by
//! `usearch`'s HNSW implementation. Recall@k >= 0.9 against brute force is
//! the target; exact recall is explicitly not required.

use std::collections::HashMap;

use thiserror::Error;

use crate::id::NodeId;
use crate::vector::Vector;

pub const DEFAULT_CONNECTIVITY: usize = 16;
pub const DEFAULT_EXPANSION_ADD: usize = 128;
pub const DEFAULT_EXPANSION_SEARCH: usize = 64;

#[derive(Debug, Error)]
pub enum AnnError {
    #[error("failed to create ANN index: {0}")]
    Creation(String),
    #[error("failed to add vector to ANN index: {0}")]
    Add(String),
    #[error("failed to search ANN index: {0}")]
    Search(String),
    #[error("ANN index dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, AnnError>;

#[derive(Debug, Clone)]
pub struct AnnConfig {
    pub dimensions: usize,
    pub connectivity: usize,
    pub expansion_add: usize,
    pub expansion_search: usize,
}

impl AnnConfig {
    pub fn new(dimensions: usize) -> Self {
        AnnConfig {
            dimensions,
            connectivity: DEFAULT_CONNECTIVITY,
            expansion_add: DEFAULT_EXPANSION_ADD,
            expansion_search: DEFAULT_EXPANSION_SEARCH,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnStats {
    pub len: usize,
    pub dimensions: usize,
    pub capacity: usize,
}

/// Insert/remove/search over node embeddings. Maintains its own
/// `NodeId <-> u64` mapping since `usearch` keys on dense integers, not the
/// 128-bit ids the rest of the engine uses.
#[cfg(feature = "vector-search")]
pub struct AnnIndex {
    index: usearch::Index,
    config: AnnConfig,
    key_to_id: HashMap<u64, NodeId>,
    id_to_key: HashMap<NodeId, u64>,
    next_key: u64,
}

#[cfg(feature = "vector-search")]
impl AnnIndex {
    pub fn new(dimensions: usize) -> Result<Self> {
        Self::with_config(AnnConfig::new(dimensions))
    }

    pub fn with_config(config: AnnConfig) -> Result<Self> {
        let options = usearch::IndexOptions {
            dimensions: config.dimensions,
            metric: usearch::MetricKind::Cos,
            quantization: usearch::ScalarKind::F32,
            connectivity: config.connectivity,
            expansion_add: config.expansion_add,
            expansion_search: config.expansion_search,
            multi: false,
        };
        let index = usearch::Index::new(&options).map_err(|e| AnnError::Creation(e.to_string()))?;
        index
            .reserve(1024)
            .map_err(|e| AnnError::Creation(e.to_string()))?;
        Ok(AnnIndex {
            index,
            config,
            key_to_id: HashMap::new(),
            id_to_key: HashMap::new(),
            next_key: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn ensure_capacity(&self) -> Result<()> {
        if self.index.size() + 1 > self.index.capacity() {
            let new_capacity = (self.index.capacity() * 2).max(1024);
            self.index
                .reserve(new_capacity)
                .map_err(|e| AnnError::Add(e.to_string()))?;
        }
        Ok(())
    }

    pub fn add(&mut self, id: NodeId, vector: &Vector) -> Result<()> {
        if vector.dim() != self.config.dimensions {
            return Err(AnnError::DimensionMismatch {
                expected: self.config.dimensions,
                actual: vector.dim(),
            });
        }
        if let Some(existing_key) = self.id_to_key.get(&id).copied() {
            let _ = self.index.remove(existing_key);
            self.key_to_id.remove(&existing_key);
        }
        self.ensure_capacity()?;
        let key = self.next_key;
        self.next_key += 1;
        self.index
            .add(key, &vector.0)
            .map_err(|e| AnnError::Add(e.to_string()))?;
        self.key_to_id.insert(key, id);
        self.id_to_key.insert(id, key);
        Ok(())
    }

    pub fn remove(&mut self, id: &NodeId) -> Result<bool> {
        let Some(key) = self.id_to_key.remove(id) else {
            return Ok(false);
        };
        self.key_to_id.remove(&key);
        self.index
            .remove(key)
            .map_err(|e| AnnError::Search(e.to_string()))?;
        Ok(true)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.id_to_key.contains_key(id)
    }

    /// Returns up to `k` `(id, cosine)` pairs, descending by similarity.
    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<(NodeId, f32)>> {
        if query.dim() != self.config.dimensions {
            return Err(AnnError::DimensionMismatch {
                expected: self.config.dimensions,
                actual: query.dim(),
            });
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let matches = self
            .index
            .search(&query.0, k)
            .map_err(|e| AnnError::Search(e.to_string()))?;
        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter_map(|(key, distance)| {
                self.key_to_id.get(key).map(|id| (*id, 1.0 - distance))
            })
            .collect())
    }

    pub fn search_with_threshold(
        &self,
        query: &Vector,
        k: usize,
        threshold: f32,
    ) -> Result<Vec<(NodeId, f32)>> {
        Ok(self
            .search(query, k)?
            .into_iter()
            .filter(|(_, score)| *score >= threshold)
            .collect())
    }

    pub fn stats(&self) -> AnnStats {
        AnnStats {
            len: self.len(),
            dimensions: self.config.dimensions,
            capacity: self.index.capacity(),
        }
    }
}

/// Stand-in used when the `vector-search` feature is disabled: dense search
/// is simply unavailable and retrieval falls back to lexical-only.
#[cfg(not(feature = "vector-search"))]
pub struct AnnIndex;

#[cfg(not(feature = "vector-search"))]
impl AnnIndex {
    pub fn new(_dimensions: usize) -> Result<Self> {
        Ok(AnnIndex)
    }

    pub fn len(&self) -> usize {
        0
    }

    pub fn is_empty(&self) -> bool {
        true
    }

    pub fn add(&mut self, _id: NodeId, _vector: &Vector) -> Result<()> {
        Ok(())
    }

    pub fn remove(&mut self, _id: &NodeId) -> Result<bool> {
        Ok(false)
    }

    pub fn contains(&self, _id: &NodeId) -> bool {
        false
    }

    pub fn search(&self, _query: &Vector, _k: usize) -> Result<Vec<(NodeId, f32)>> {
        Ok(Vec::new())
    }

    pub fn search_with_threshold(
        &self,
        _query: &Vector,
        _k: usize,
        _threshold: f32,
    ) -> Result<Vec<(NodeId, f32)>> {
        Ok(Vec::new())
    }
}
