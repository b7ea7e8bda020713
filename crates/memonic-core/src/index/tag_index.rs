//! Multi-valued tag index backed by bitmap sets, for fast AND/OR/set
//! operations over node id collections. `RoaringBitmap` needs `u32` keys, so
//! this keeps its own dense-id mapping, the same trick [`super::ann`] uses
//! for `usearch`.

use std::collections::HashMap;

use roaring::RoaringBitmap;

use crate::id::NodeId;

#[derive(Default)]
pub struct TagIndex {
    tag_to_bitmap: HashMap<String, RoaringBitmap>,
    id_to_dense: HashMap<NodeId, u32>,
    dense_to_id: HashMap<u32, NodeId>,
    next_dense: u32,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn dense_id(&mut self, id: NodeId) -> u32 {
        if let Some(d) = self.id_to_dense.get(&id) {
            return *d;
        }
        let d = self.next_dense;
        self.next_dense += 1;
        self.id_to_dense.insert(id, d);
        self.dense_to_id.insert(d, id);
        d
    }

    pub fn add_tag(&mut self, id: NodeId, tag: &str) {
        let dense = self.dense_id(id);
        self.tag_to_bitmap.entry(tag.to_string()).or_default().insert(dense);
    }

    pub fn remove_tag(&mut self, id: NodeId, tag: &str) {
        if let Some(dense) = self.id_to_dense.get(&id) {
            if let Some(bitmap) = self.tag_to_bitmap.get_mut(tag) {
                bitmap.remove(*dense);
            }
        }
    }

    pub fn remove_node(&mut self, id: &NodeId) {
        if let Some(dense) = self.id_to_dense.remove(id) {
            self.dense_to_id.remove(&dense);
            for bitmap in self.tag_to_bitmap.values_mut() {
                bitmap.remove(dense);
            }
        }
    }

    pub fn find(&self, tag: &str) -> Vec<NodeId> {
        self.tag_to_bitmap
            .get(tag)
            .map(|b| b.iter().filter_map(|d| self.dense_to_id.get(&d).copied()).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: &NodeId, tag: &str) -> bool {
        match (self.id_to_dense.get(id), self.tag_to_bitmap.get(tag)) {
            (Some(dense), Some(bitmap)) => bitmap.contains(*dense),
            _ => false,
        }
    }

    fn bitmap_for(&self, tag: &str) -> RoaringBitmap {
        self.tag_to_bitmap.get(tag).cloned().unwrap_or_default()
    }

    /// Nodes carrying every tag in `tags`.
    pub fn find_all(&self, tags: &[&str]) -> Vec<NodeId> {
        if tags.is_empty() {
            return Vec::new();
        }
        let mut result = self.bitmap_for(tags[0]);
        for tag in &tags[1..] {
            result &= self.bitmap_for(tag);
        }
        result.iter().filter_map(|d| self.dense_to_id.get(&d).copied()).collect()
    }

    /// Nodes carrying any tag in `tags`.
    pub fn find_any(&self, tags: &[&str]) -> Vec<NodeId> {
        let mut result = RoaringBitmap::new();
        for tag in tags {
            result |= self.bitmap_for(tag);
        }
        result.iter().filter_map(|d| self.dense_to_id.get(&d).copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_returns_tagged_nodes() {
        let mut idx = TagIndex::new();
        let a = NodeId::new();
        let b = NodeId::new();
        idx.add_tag(a, "rust");
        idx.add_tag(b, "golang");
        assert_eq!(idx.find("rust"), vec![a]);
    }

    #[test]
    fn find_all_is_intersection() {
        let mut idx = TagIndex::new();
        let a = NodeId::new();
        let b = NodeId::new();
        idx.add_tag(a, "rust");
        idx.add_tag(a, "memory");
        idx.add_tag(b, "rust");
        let result = idx.find_all(&["rust", "memory"]);
        assert_eq!(result, vec![a]);
    }

    #[test]
    fn find_any_is_union() {
        let mut idx = TagIndex::new();
        let a = NodeId::new();
        let b = NodeId::new();
        idx.add_tag(a, "rust");
        idx.add_tag(b, "golang");
        let mut result = idx.find_any(&["rust", "golang"]);
        result.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(result, expected);
    }

    #[test]
    fn remove_node_clears_all_memberships() {
        let mut idx = TagIndex::new();
        let a = NodeId::new();
        idx.add_tag(a, "rust");
        idx.remove_node(&a);
        assert!(idx.find("rust").is_empty());
    }

    #[test]
    fn duplicate_tag_add_is_idempotent() {
        let mut idx = TagIndex::new();
        let a = NodeId::new();
        idx.add_tag(a, "rust");
        idx.add_tag(a, "rust");
        assert_eq!(idx.find("rust"), vec![a]);
    }
}
