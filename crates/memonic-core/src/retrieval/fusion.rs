//! Reciprocal rank fusion for combining dense and sparse result lists in
//! hybrid mode. Grounded in the same RRF formula the teacher crate's
//! `search::hybrid` module used, generalized from string keys to [`NodeId`].

use std::collections::HashMap;

use crate::id::NodeId;

/// Standard RRF damping constant.
pub const RRF_K0: f32 = 60.0;

/// `score(d) = sum over lists of 1/(k0 + rank)`, rank 0-based within each
/// input list. Inputs need not overlap; a result appearing in only one list
/// still gets a score.
pub fn reciprocal_rank_fusion(lists: &[&[(NodeId, f32)]]) -> Vec<(NodeId, f32)> {
    let mut scores: HashMap<NodeId, f32> = HashMap::new();
    for list in lists {
        for (rank, (id, _)) in list.iter().enumerate() {
            *scores.entry(*id).or_insert(0.0) += 1.0 / (RRF_K0 + rank as f32);
        }
    }
    let mut ranked: Vec<(NodeId, f32)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_in_both_lists_outranks_single_list_result() {
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        let dense = vec![(a, 0.9), (b, 0.8)];
        let sparse = vec![(a, 5.0), (c, 4.0)];
        let fused = reciprocal_rank_fusion(&[&dense, &sparse]);
        assert_eq!(fused[0].0, a);
    }

    #[test]
    fn empty_lists_produce_empty_fusion() {
        let empty: Vec<(NodeId, f32)> = vec![];
        assert!(reciprocal_rank_fusion(&[&empty, &empty]).is_empty());
    }
}
