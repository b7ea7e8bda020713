//! Session context: active intentions, recent observations, and the goal
//! basin derived from them. This is the priming source §4.6 draws on — a
//! small amount of state about "what the caller is doing right now" that
//! nudges retrieval without being persisted as nodes itself.

use std::collections::VecDeque;

use crate::external::Embedder;
use crate::vector::Vector;

/// Recent observations beyond this count are dropped, oldest first. Keeps
/// the goal-basin centroid computation bounded and keeps stale context from
/// dominating priming indefinitely.
pub const MAX_RECENT_OBSERVATIONS: usize = 20;

/// Bounded recent-activity window used to derive a priming vector. Entirely
/// in-memory and per-process — it is not part of the durable store and does
/// not survive a daemon restart.
#[derive(Default)]
pub struct SessionContext {
    intentions: Vec<String>,
    recent_observations: VecDeque<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_intentions(&mut self, intentions: Vec<String>) {
        self.intentions = intentions;
    }

    pub fn add_intention(&mut self, intention: String) {
        self.intentions.push(intention);
    }

    pub fn observe(&mut self, text: String) {
        self.recent_observations.push_back(text);
        while self.recent_observations.len() > MAX_RECENT_OBSERVATIONS {
            self.recent_observations.pop_front();
        }
    }

    pub fn intentions(&self) -> &[String] {
        &self.intentions
    }

    pub fn recent_observations(&self) -> impl Iterator<Item = &String> {
        self.recent_observations.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.intentions.is_empty() && self.recent_observations.is_empty()
    }

    /// The goal basin: the mean embedding of every intention and recent
    /// observation currently tracked. `None` when there's nothing to embed
    /// or the embedder is unavailable for all of them.
    pub fn goal_basin(&self, embedder: &dyn Embedder) -> Option<Vector> {
        let mut sum: Option<Vector> = None;
        let mut count = 0usize;
        for text in self.intentions.iter().chain(self.recent_observations.iter()) {
            if let Ok(v) = embedder.embed(text) {
                sum = Some(match sum {
                    Some(acc) => acc.add(&v),
                    None => v,
                });
                count += 1;
            }
        }
        sum.map(|v| v.scale(1.0 / count.max(1) as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{EmbedError, Embedder};

    struct FakeEmbedder;
    impl Embedder for FakeEmbedder {
        fn dimensions(&self) -> usize {
            4
        }
        fn embed(&self, text: &str) -> Result<Vector, EmbedError> {
            Ok(Vector(vec![text.len() as f32, 0.0, 0.0, 0.0]))
        }
    }

    #[test]
    fn empty_session_has_no_goal_basin() {
        let ctx = SessionContext::new();
        assert!(ctx.goal_basin(&FakeEmbedder).is_none());
    }

    #[test]
    fn goal_basin_averages_intentions_and_observations() {
        let mut ctx = SessionContext::new();
        ctx.add_intention("ab".into());
        ctx.observe("abcd".into());
        let basin = ctx.goal_basin(&FakeEmbedder).unwrap();
        assert_eq!(basin.0[0], 3.0);
    }

    #[test]
    fn recent_observations_are_bounded() {
        let mut ctx = SessionContext::new();
        for i in 0..(MAX_RECENT_OBSERVATIONS + 5) {
            ctx.observe(format!("obs-{i}"));
        }
        assert_eq!(ctx.recent_observations().count(), MAX_RECENT_OBSERVATIONS);
        assert_eq!(ctx.recent_observations().next().unwrap(), "obs-5");
    }
}
