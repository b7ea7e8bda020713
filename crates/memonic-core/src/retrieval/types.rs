use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::memory::Node;

/// Which retrieval channels `recall` combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Dense,
    Sparse,
    Hybrid,
}

/// How wide the initial ANN candidate pool is cast before the rest of the
/// pipeline narrows it down. Wider zoom costs more but recalls more broadly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zoom {
    Narrow,
    Normal,
    Broad,
}

impl Zoom {
    /// `K >= limit * fanout`, fanout in `[3, 10]`.
    pub fn fanout(self) -> usize {
        match self {
            Zoom::Narrow => 3,
            Zoom::Normal => 5,
            Zoom::Broad => 10,
        }
    }
}

/// Options common to `recall`/`resonate`/`full_resonate`.
#[derive(Debug, Clone)]
pub struct RecallOptions {
    pub limit: usize,
    pub threshold: f32,
    pub mode: SearchMode,
    pub zoom: Zoom,
    pub tag: Option<String>,
    pub primed: bool,
    pub learn: bool,
    pub compete: bool,
    pub spread_strength: f32,
    pub hebbian_strength: f32,
    pub exclude_tags: Vec<String>,
}

impl Default for RecallOptions {
    fn default() -> Self {
        RecallOptions {
            limit: 10,
            threshold: 0.0,
            mode: SearchMode::Hybrid,
            zoom: Zoom::Normal,
            tag: None,
            primed: false,
            learn: false,
            compete: false,
            spread_strength: 1.0,
            hebbian_strength: 0.04,
            exclude_tags: Vec::new(),
        }
    }
}

/// One scored result from a retrieval operation.
#[derive(Debug, Clone)]
pub struct Recall {
    pub id: NodeId,
    pub relevance: f32,
    pub node: Node,
}
