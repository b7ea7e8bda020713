//! 128-bit node identifiers.
//!
//! IDs are never reused. They are generated from a UUID v4 (128 bits of
//! entropy is plenty for the id space this store needs) but stored and
//! compared as a plain `u128` so the rest of the engine never has to reason
//! about UUID variants/versions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A stable, unique 128-bit node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u128);

impl NodeId {
    /// Generates a fresh random id. Collisions are astronomically unlikely
    /// (122 bits of entropy from the underlying UUID v4) and are not checked
    /// for here; callers that need a guarantee should consult the store.
    pub fn new() -> Self {
        NodeId(uuid::Uuid::new_v4().as_u128())
    }

    /// Lower-case hex with a single `-` separator between the two 64-bit
    /// halves, e.g. `0123456789abcdef-fedcba9876543210`.
    pub fn to_string_hex(self) -> String {
        format!("{:016x}-{:016x}", (self.0 >> 64) as u64, self.0 as u64)
    }

    pub fn from_string_hex(s: &str) -> Option<Self> {
        let (hi, lo) = s.split_once('-')?;
        let hi = u64::from_str_radix(hi, 16).ok()?;
        let lo = u64::from_str_radix(lo, 16).ok()?;
        Some(NodeId(((hi as u128) << 64) | lo as u128))
    }

    /// Mixes both 64-bit halves into a single hash, used by bucket/shard
    /// placement where a single `u128` would be wasteful to carry around.
    pub fn mix_hash(self) -> u64 {
        let hi = (self.0 >> 64) as u64;
        let lo = self.0 as u64;
        // splitmix64-style finalizer, applied to hi ^ (lo rotated).
        let mut x = hi ^ lo.rotate_left(32);
        x ^= x >> 30;
        x = x.wrapping_mul(0xbf58476d1ce4e5b9);
        x ^= x >> 27;
        x = x.wrapping_mul(0x94d049bb133111eb);
        x ^= x >> 31;
        x
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_hex() {
        let id = NodeId::new();
        let s = id.to_string_hex();
        let back = NodeId::from_string_hex(&s).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn distinct_ids_are_distinct() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn mix_hash_is_deterministic() {
        let id = NodeId::new();
        assert_eq!(id.mix_hash(), id.mix_hash());
    }

    #[test]
    fn from_string_hex_rejects_garbage() {
        assert!(NodeId::from_string_hex("not-an-id").is_none());
        assert!(NodeId::from_string_hex("nodash").is_none());
    }
}
