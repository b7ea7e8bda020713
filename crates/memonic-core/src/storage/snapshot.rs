//! Generation-numbered snapshots: `P.snapshot.<gen>` packs the hot tier (full
//! node records) plus a header recording the WAL lsn the snapshot is
//! consistent up to. On startup the latest generation is loaded, then the WAL
//! is replayed from `header.lsn` forward.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::memory::Node;

use super::error::Result;

/// On-disk format version. Bumped whenever the snapshot or WAL wire format
/// changes; `memonic upgrade` migrates a store whose header version is older
/// than this forward.
pub const STORE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub format_version: u32,
    pub generation: u64,
    /// The WAL lsn this snapshot is consistent up to; replay resumes here.
    pub lsn: u64,
    pub node_count: usize,
    pub embedding_dim: usize,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    header: SnapshotHeader,
    nodes: Vec<Node>,
}

pub fn snapshot_path(store_path: &Path, generation: u64) -> PathBuf {
    let mut p = store_path.as_os_str().to_owned();
    p.push(format!(".snapshot.{generation}"));
    PathBuf::from(p)
}

pub fn write_snapshot(
    store_path: &Path,
    generation: u64,
    lsn: u64,
    embedding_dim: usize,
    nodes: &[Node],
) -> Result<PathBuf> {
    let path = snapshot_path(store_path, generation);
    let tmp_path = path.with_extension("tmp");
    let file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);
    let snapshot = SnapshotFile {
        header: SnapshotHeader {
            format_version: STORE_FORMAT_VERSION,
            generation,
            lsn,
            node_count: nodes.len(),
            embedding_dim,
        },
        nodes: nodes.to_vec(),
    };
    serde_json::to_writer(&mut writer, &snapshot)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(&tmp_path, &path)?;
    Ok(path)
}

pub fn load_latest_snapshot(store_path: &Path) -> Result<Option<(SnapshotHeader, Vec<Node>)>> {
    let dir = store_path.parent().unwrap_or_else(|| Path::new("."));
    let prefix = store_path
        .file_name()
        .map(|n| format!("{}.snapshot.", n.to_string_lossy()))
        .unwrap_or_default();

    let mut best: Option<u64> = None;
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(gen_str) = name.strip_prefix(&prefix) {
                if let Ok(gen) = gen_str.parse::<u64>() {
                    best = Some(best.map_or(gen, |b| b.max(gen)));
                }
            }
        }
    }

    let Some(generation) = best else {
        return Ok(None);
    };
    let path = snapshot_path(store_path, generation);
    let file = File::open(&path)?;
    let reader = BufReader::new(file);
    let snapshot: SnapshotFile = serde_json::from_reader(reader)?;
    Ok(Some((snapshot.header, snapshot.nodes)))
}

/// Removes snapshot generations older than `keep_generation`, once a newer
/// snapshot (and the WAL truncation that follows it) has made them moot.
pub fn prune_old_generations(store_path: &Path, keep_generation: u64) -> Result<()> {
    let dir = store_path.parent().unwrap_or_else(|| Path::new("."));
    let prefix = store_path
        .file_name()
        .map(|n| format!("{}.snapshot.", n.to_string_lossy()))
        .unwrap_or_default();
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(gen_str) = name.strip_prefix(&prefix) {
            if let Ok(gen) = gen_str.parse::<u64>() {
                if gen < keep_generation {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::memory::NodeKind;

    #[test]
    fn write_then_load_latest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("store");
        let node = Node::new(
            NodeKind::Episode,
            b"hi".to_vec(),
            Some("hi".into()),
            None,
            HashSet::new(),
            None,
            8,
        );
        write_snapshot(&store_path, 1, 10, 8, &[node.clone()]).unwrap();
        write_snapshot(&store_path, 2, 20, 8, &[node.clone()]).unwrap();

        let (header, nodes) = load_latest_snapshot(&store_path).unwrap().unwrap();
        assert_eq!(header.generation, 2);
        assert_eq!(header.lsn, 20);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, node.id);
    }

    #[test]
    fn load_latest_on_empty_dir_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("store");
        assert!(load_latest_snapshot(&store_path).unwrap().is_none());
    }

    #[test]
    fn prune_removes_older_generations() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("store");
        write_snapshot(&store_path, 1, 1, 8, &[]).unwrap();
        write_snapshot(&store_path, 2, 2, 8, &[]).unwrap();
        prune_old_generations(&store_path, 2).unwrap();
        assert!(!snapshot_path(&store_path, 1).exists());
        assert!(snapshot_path(&store_path, 2).exists());
    }
}
