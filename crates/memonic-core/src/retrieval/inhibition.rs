//! Lateral inhibition: competition among ranked candidates so that near-
//! duplicate results don't crowd out diverse ones. Higher-ranked candidates
//! suppress the relevance of lower-ranked candidates they're similar to.

use crate::id::NodeId;
use crate::vector::Vector;

/// Candidates below this cosine similarity to a higher-ranked one are left
/// alone — they're different enough not to compete.
pub const SIMILARITY_THRESHOLD: f32 = 0.8;
/// How strongly a higher-ranked candidate suppresses a similar lower-ranked
/// one, scaled by both the similarity and the higher one's relevance.
pub const INHIBITION_STRENGTH: f32 = 0.3;
/// Candidates whose relevance is pushed below this floor are dropped
/// entirely when hard suppression is requested.
pub const SUPPRESSION_FLOOR: f32 = 0.05;

/// Input already sorted by relevance, descending. Mutates relevance in
/// place; optionally drops candidates that fall below [`SUPPRESSION_FLOOR`].
pub fn apply_lateral_inhibition(
    candidates: &mut Vec<(NodeId, Vector, f32)>,
    hard_suppress: bool,
) {
    for i in 0..candidates.len() {
        let (vi, reli) = (candidates[i].1.clone(), candidates[i].2);
        for j in (i + 1)..candidates.len() {
            let cos = vi.cosine(&candidates[j].1);
            if cos >= SIMILARITY_THRESHOLD {
                let reduction = INHIBITION_STRENGTH * cos * reli;
                candidates[j].2 = (candidates[j].2 - reduction).max(0.0);
            }
        }
    }
    if hard_suppress {
        candidates.retain(|(_, _, rel)| *rel >= SUPPRESSION_FLOOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_duplicate_is_suppressed() {
        let a = Vector(vec![1.0, 0.0]);
        let b = Vector(vec![0.99, 0.01]).normalize();
        let mut candidates = vec![(NodeId::new(), a, 1.0), (NodeId::new(), b, 0.9)];
        apply_lateral_inhibition(&mut candidates, false);
        assert!(candidates[1].2 < 0.9);
    }

    #[test]
    fn dissimilar_results_are_untouched() {
        let a = Vector(vec![1.0, 0.0]);
        let b = Vector(vec![0.0, 1.0]);
        let mut candidates = vec![(NodeId::new(), a, 1.0), (NodeId::new(), b, 0.9)];
        apply_lateral_inhibition(&mut candidates, false);
        assert_eq!(candidates[1].2, 0.9);
    }

    #[test]
    fn hard_suppress_drops_below_floor() {
        let a = Vector(vec![1.0, 0.0]);
        let b = Vector(vec![1.0, 0.0]);
        let mut candidates = vec![(NodeId::new(), a, 1.0), (NodeId::new(), b, 0.06)];
        apply_lateral_inhibition(&mut candidates, true);
        assert_eq!(candidates.len(), 1);
    }
}
