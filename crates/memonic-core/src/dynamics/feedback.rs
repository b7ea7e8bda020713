//! The feedback queue: retrieval and explicit `feedback` calls enqueue
//! events here; a dynamics cycle drains and aggregates them into confidence
//! updates. Kept off the request hot path — recording a feedback event never
//! blocks on the store lock.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// The kinds of feedback the engine recognizes, each with a magnitude on
/// `[-1, 1]` scaling the default per-event delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Used,
    Helpful,
    Misleading,
    Confirmed,
    Challenged,
}

impl FeedbackKind {
    /// Default signed delta applied to confidence for one unit-magnitude
    /// event of this kind.
    pub fn default_delta(self) -> f32 {
        match self {
            FeedbackKind::Used => 0.01,
            FeedbackKind::Helpful => 0.1,
            FeedbackKind::Misleading => -0.15,
            FeedbackKind::Confirmed => 0.08,
            FeedbackKind::Challenged => -0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackEvent {
    pub node_id: NodeId,
    pub kind: FeedbackKind,
    pub magnitude: f32,
}

impl FeedbackEvent {
    pub fn new(node_id: NodeId, kind: FeedbackKind, magnitude: f32) -> Self {
        FeedbackEvent {
            node_id,
            kind,
            magnitude: magnitude.clamp(0.0, 1.0),
        }
    }

    pub fn signed_delta(&self) -> f32 {
        self.kind.default_delta() * self.magnitude
    }
}

/// A simple mutex-guarded multi-producer queue. Recording a feedback event
/// is an `O(1)` push; a dynamics cycle drains the whole thing at once.
#[derive(Default)]
pub struct FeedbackQueue {
    events: Mutex<Vec<FeedbackEvent>>,
}

impl FeedbackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: FeedbackEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }

    /// Drains every queued event, aggregated per-node by summed signed
    /// delta. Feedback linearity (§8, property 8) falls directly out of this
    /// aggregation: `k` copies of the same event sum to `k` times one.
    pub fn drain_aggregated(&self) -> HashMap<NodeId, f32> {
        let mut drained = match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        };
        let mut totals: HashMap<NodeId, f32> = HashMap::new();
        for event in drained.drain(..) {
            *totals.entry(event.node_id).or_insert(0.0) += event.signed_delta();
        }
        totals
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_linearity_k_events_equals_k_times_one() {
        let q = FeedbackQueue::new();
        let id = NodeId::new();
        for _ in 0..4 {
            q.push(FeedbackEvent::new(id, FeedbackKind::Helpful, 1.0));
        }
        let totals = q.drain_aggregated();
        assert!((totals[&id] - 4.0 * FeedbackKind::Helpful.default_delta()).abs() < 1e-6);
    }

    #[test]
    fn drain_empties_the_queue() {
        let q = FeedbackQueue::new();
        q.push(FeedbackEvent::new(NodeId::new(), FeedbackKind::Used, 1.0));
        q.drain_aggregated();
        assert!(q.is_empty());
    }

    #[test]
    fn misleading_and_challenged_are_negative() {
        assert!(FeedbackKind::Misleading.default_delta() < 0.0);
        assert!(FeedbackKind::Challenged.default_delta() < 0.0);
    }
}
