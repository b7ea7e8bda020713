//! Deterministic socket-path derivation (§4.10, §6): one daemon per store
//! path, addressed without the client needing to know a port or a
//! hand-configured path.

use std::path::{Path, PathBuf};

const PREFIX: &str = "memonic";

/// djb2 hash of the canonicalized store path, as an unsigned 32-bit value.
fn djb2(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 5381;
    for &b in bytes {
        hash = hash.wrapping_mul(33).wrapping_add(b as u32);
    }
    hash
}

/// `/tmp/<prefix>-<hash32>.sock` for the store at `store_path`. Falls back to
/// hashing the uncanonicalized path if the store directory doesn't exist yet
/// (canonicalize requires the path to exist).
pub fn derive_socket_path(store_path: &Path) -> PathBuf {
    let canonical = store_path
        .canonicalize()
        .unwrap_or_else(|_| store_path.to_path_buf());
    let hash = djb2(canonical.to_string_lossy().as_bytes());
    std::env::temp_dir().join(format!("{PREFIX}-{hash:08x}.sock"))
}
