use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// The typed relationship a directed edge carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Mentions,
    Causes,
    IsA,
    PartOf,
    Supports,
    Contradicts,
    Related,
    /// Created/strengthened by co-retrieval rather than explicit authoring.
    Hebbian,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Mentions => "mentions",
            EdgeType::Causes => "causes",
            EdgeType::IsA => "is_a",
            EdgeType::PartOf => "part_of",
            EdgeType::Supports => "supports",
            EdgeType::Contradicts => "contradicts",
            EdgeType::Related => "related",
            EdgeType::Hebbian => "hebbian",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mentions" => Ok(EdgeType::Mentions),
            "causes" => Ok(EdgeType::Causes),
            "is_a" => Ok(EdgeType::IsA),
            "part_of" => Ok(EdgeType::PartOf),
            "supports" => Ok(EdgeType::Supports),
            "contradicts" => Ok(EdgeType::Contradicts),
            "related" => Ok(EdgeType::Related),
            "hebbian" => Ok(EdgeType::Hebbian),
            other => Err(format!("unknown edge type: {other}")),
        }
    }
}

/// A directed edge from its owning node to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub target: NodeId,
    pub edge_type: EdgeType,
    pub weight: f32,
}

impl Edge {
    pub fn new(target: NodeId, edge_type: EdgeType, weight: f32) -> Self {
        Edge {
            target,
            edge_type,
            weight: weight.clamp(0.0, 1.0),
        }
    }

    /// Strengthens the edge weight, clamped at `1.0`, as Hebbian updates do.
    pub fn strengthen(&mut self, delta: f32) {
        self.weight = (self.weight + delta).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_type_roundtrips_through_str() {
        for et in [
            EdgeType::Mentions,
            EdgeType::Causes,
            EdgeType::IsA,
            EdgeType::PartOf,
            EdgeType::Supports,
            EdgeType::Contradicts,
            EdgeType::Related,
            EdgeType::Hebbian,
        ] {
            let s = et.to_string();
            assert_eq!(EdgeType::from_str(&s).unwrap(), et);
        }
    }

    #[test]
    fn weight_is_clamped_on_construction() {
        let e = Edge::new(NodeId::new(), EdgeType::Related, 5.0);
        assert_eq!(e.weight, 1.0);
    }

    #[test]
    fn strengthen_clamps_at_one() {
        let mut e = Edge::new(NodeId::new(), EdgeType::Hebbian, 0.97);
        e.strengthen(0.1);
        assert_eq!(e.weight, 1.0);
    }
}
