use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::memory::confidence::Confidence;
use crate::memory::edge::Edge;
use crate::time::now_millis;
use crate::vector::Vector;

/// The tagged union of what a node can represent. Kept as a flat enum rather
/// than a trait hierarchy — predicates like [`NodeKind::is_pinned`] replace
/// what would otherwise be virtual dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Episode,
    Wisdom,
    Belief,
    Failure,
    Question,
    Gap,
    Invariant,
    Intention,
    StoryThread,
    Term,
    Entity,
    Symbol,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Episode => "episode",
            NodeKind::Wisdom => "wisdom",
            NodeKind::Belief => "belief",
            NodeKind::Failure => "failure",
            NodeKind::Question => "question",
            NodeKind::Gap => "gap",
            NodeKind::Invariant => "invariant",
            NodeKind::Intention => "intention",
            NodeKind::StoryThread => "story_thread",
            NodeKind::Term => "term",
            NodeKind::Entity => "entity",
            NodeKind::Symbol => "symbol",
        }
    }

    /// Pinned kinds survive pruning regardless of effective confidence.
    pub fn is_pinned(&self) -> bool {
        matches!(
            self,
            NodeKind::Belief | NodeKind::Invariant | NodeKind::Intention
        )
    }

    /// Whether nodes of this kind are eligible inputs to wisdom synthesis.
    /// A Wisdom node summarizing other Wisdom nodes would recurse forever.
    pub fn is_synthesizable(&self) -> bool {
        !matches!(self, NodeKind::Wisdom | NodeKind::Invariant)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "episode" => Ok(NodeKind::Episode),
            "wisdom" => Ok(NodeKind::Wisdom),
            "belief" => Ok(NodeKind::Belief),
            "failure" => Ok(NodeKind::Failure),
            "question" => Ok(NodeKind::Question),
            "gap" => Ok(NodeKind::Gap),
            "invariant" => Ok(NodeKind::Invariant),
            "intention" => Ok(NodeKind::Intention),
            "story_thread" => Ok(NodeKind::StoryThread),
            "term" => Ok(NodeKind::Term),
            "entity" => Ok(NodeKind::Entity),
            "symbol" => Ok(NodeKind::Symbol),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

/// Which tier currently owns a node's storage representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cold => "cold",
        };
        f.write_str(s)
    }
}

/// Where a node came from: what produced it, within which session, and an
/// optional scoping realm. All optional — most nodes carry no provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: Option<String>,
    pub session_id: Option<String>,
    /// See the realm-scoping decision in this repo's design notes: stored
    /// and filterable, not otherwise enforced.
    pub realm: Option<String>,
}

/// A unit of memory: the record the tiered store owns and every index holds
/// a non-owning `NodeId` reference into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub payload_bytes: Vec<u8>,
    /// Decoded textual view, cached at construction/update time so retrieval
    /// doesn't have to guess an encoding on every search.
    pub text: Option<String>,
    pub embedding: Vector,
    pub has_embedding: bool,
    pub confidence: Confidence,
    pub epsilon: f32,
    pub delta: f32,
    pub tau_created: i64,
    pub tau_accessed: i64,
    pub tier: Tier,
    pub tags: HashSet<String>,
    pub edges: Vec<Edge>,
    pub provenance: Option<Provenance>,
    pub times_retrieved: u64,
}

/// Per-node decay rate used when none is specified at creation. Nodes that
/// decay faster than this (e.g. ephemeral observations) set `delta` higher.
pub const DEFAULT_DELTA: f32 = 0.05;

impl Node {
    /// Creates a fresh node as `remember` specifies: tier=Hot, confidence
    /// defaults (mu=0.7, sigma2=0.1, n=1), both timestamps set to now.
    pub fn new(
        kind: NodeKind,
        payload_bytes: Vec<u8>,
        text: Option<String>,
        embedding: Option<Vector>,
        tags: HashSet<String>,
        provenance: Option<Provenance>,
        dim: usize,
    ) -> Self {
        let now = now_millis();
        let has_embedding = embedding.is_some();
        Node {
            id: NodeId::new(),
            kind,
            payload_bytes,
            text,
            embedding: embedding.unwrap_or_else(|| Vector::zero(dim)),
            has_embedding,
            confidence: Confidence::default(),
            epsilon: 0.0,
            delta: DEFAULT_DELTA,
            tau_created: now,
            tau_accessed: now,
            tier: Tier::Hot,
            tags,
            edges: Vec::new(),
            provenance,
            times_retrieved: 0,
        }
    }

    pub fn effective_confidence(&self) -> f32 {
        self.confidence.effective()
    }

    /// Marks the node as just-retrieved. Per the time-source contract this
    /// must be called **after** the node has contributed to scoring, so a
    /// request can't prime itself mid-flight.
    pub fn mark_accessed(&mut self) {
        let now = now_millis();
        self.tau_accessed = self.tau_accessed.max(now);
        self.times_retrieved += 1;
    }

    pub fn add_tag(&mut self, tag: String) -> bool {
        self.tags.insert(tag)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }
}

/// Request DTO for `remember`/`observe`. `deny_unknown_fields` rejects any
/// extra JSON field outright rather than silently ignoring it — a client
/// sending a typo'd field name gets an error instead of a node missing data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RememberInput {
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub realm: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_roundtrips_through_str() {
        for k in [
            NodeKind::Episode,
            NodeKind::Wisdom,
            NodeKind::Belief,
            NodeKind::Failure,
            NodeKind::Question,
            NodeKind::Gap,
            NodeKind::Invariant,
            NodeKind::Intention,
            NodeKind::StoryThread,
            NodeKind::Term,
            NodeKind::Entity,
            NodeKind::Symbol,
        ] {
            assert_eq!(NodeKind::from_str(k.as_str()).unwrap(), k);
        }
    }

    #[test]
    fn pinned_kinds_are_belief_invariant_intention() {
        assert!(NodeKind::Belief.is_pinned());
        assert!(NodeKind::Invariant.is_pinned());
        assert!(NodeKind::Intention.is_pinned());
        assert!(!NodeKind::Episode.is_pinned());
    }

    #[test]
    fn new_node_has_remember_defaults() {
        let n = Node::new(
            NodeKind::Episode,
            b"hello".to_vec(),
            Some("hello".into()),
            None,
            HashSet::new(),
            None,
            8,
        );
        assert_eq!(n.tier, Tier::Hot);
        assert_eq!(n.confidence.mu, 0.7);
        assert_eq!(n.tau_accessed, n.tau_created);
        assert!(!n.has_embedding);
        assert!(n.embedding.is_zero());
    }

    #[test]
    fn mark_accessed_never_decreases_tau_accessed() {
        let mut n = Node::new(
            NodeKind::Episode,
            vec![],
            None,
            None,
            HashSet::new(),
            None,
            8,
        );
        let before = n.tau_accessed;
        n.mark_accessed();
        assert!(n.tau_accessed >= before);
        assert_eq!(n.times_retrieved, 1);
    }

    #[test]
    fn add_tag_is_idempotent() {
        let mut n = Node::new(
            NodeKind::Episode,
            vec![],
            None,
            None,
            HashSet::new(),
            None,
            8,
        );
        assert!(n.add_tag("rust".into()));
        assert!(!n.add_tag("rust".into()));
        assert_eq!(n.tags.len(), 1);
    }

    #[test]
    fn remember_input_rejects_unknown_fields() {
        let json = r#"{"kind":"episode","text":"hi","bogusField":true}"#;
        let result: Result<RememberInput, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn remember_input_accepts_known_fields() {
        let json = r#"{"kind":"episode","text":"hi","tags":["a","b"]}"#;
        let input: RememberInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.tags, vec!["a", "b"]);
    }
}
