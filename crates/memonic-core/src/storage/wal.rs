//! Write-ahead log: append-only frames of `{lsn, op, payload}`, fsynced per
//! batch. Replayed from the last snapshot's `lsn` forward on startup.
//!
//! Frame layout (all integers little-endian, frame padded to an 8-byte
//! boundary): `u64 lsn | u32 len | u8 opcode | len bytes body | u32 crc32`.
//! `crc32` covers `opcode` and `body` so a torn write at the tail (the one
//! batch the crash model allows losing) is detected and the frame dropped.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::memory::{Edge, EdgeType, NodeKind, Provenance, Tier};
use crate::vector::Vector;

use super::error::{Result, StorageError};

/// One durable mutation. Every operation that changes store state is
/// represented here before it touches in-memory structures, so replay can
/// reconstruct state from nothing but this log plus the last snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalOp {
    Remember {
        id: NodeId,
        kind: NodeKind,
        payload_bytes: Vec<u8>,
        text: Option<String>,
        embedding: Option<Vector>,
        tags: Vec<String>,
        provenance: Option<Provenance>,
        tau_created: i64,
    },
    Update {
        id: NodeId,
        text: Option<String>,
        embedding: Option<Vector>,
    },
    AddTag {
        id: NodeId,
        tag: String,
    },
    RemoveTag {
        id: NodeId,
        tag: String,
    },
    Connect {
        source: NodeId,
        edge: Edge,
    },
    Disconnect {
        source: NodeId,
        target: NodeId,
        edge_type: Option<EdgeType>,
    },
    Forget {
        id: NodeId,
    },
    ConfidenceEvidence {
        id: NodeId,
        x: f32,
    },
    Decay {
        id: NodeId,
        dt_ms: i64,
    },
    Prune {
        id: NodeId,
    },
    Tier {
        id: NodeId,
        tier: Tier,
    },
    Access {
        id: NodeId,
    },
    Epsilon {
        id: NodeId,
        epsilon: f32,
    },
}

fn opcode(op: &WalOp) -> u8 {
    match op {
        WalOp::Remember { .. } => 1,
        WalOp::Update { .. } => 2,
        WalOp::AddTag { .. } => 3,
        WalOp::RemoveTag { .. } => 4,
        WalOp::Connect { .. } => 5,
        WalOp::Disconnect { .. } => 6,
        WalOp::Forget { .. } => 7,
        WalOp::ConfidenceEvidence { .. } => 8,
        WalOp::Decay { .. } => 9,
        WalOp::Prune { .. } => 10,
        WalOp::Tier { .. } => 11,
        WalOp::Access { .. } => 12,
        WalOp::Epsilon { .. } => 13,
    }
}

pub struct Wal {
    path: PathBuf,
    file: Mutex<File>,
    next_lsn: AtomicU64,
}

impl Wal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let next_lsn = Self::scan_max_lsn(&path)?.map(|l| l + 1).unwrap_or(0);
        Ok(Wal {
            path,
            file: Mutex::new(file),
            next_lsn: AtomicU64::new(next_lsn),
        })
    }

    fn scan_max_lsn(path: &Path) -> Result<Option<u64>> {
        let mut max = None;
        for frame in WalReader::open(path)? {
            let (lsn, _) = frame?;
            max = Some(lsn);
        }
        Ok(max)
    }

    /// Appends one frame and returns its assigned lsn. Does not fsync —
    /// callers batch several appends then call [`Wal::fsync`] once.
    pub fn append(&self, op: &WalOp) -> Result<u64> {
        let lsn = self.next_lsn.fetch_add(1, Ordering::SeqCst);
        let body = serde_json::to_vec(op)?;
        let mut frame = Vec::with_capacity(8 + 4 + 1 + body.len() + 4 + 8);
        frame.extend_from_slice(&lsn.to_le_bytes());
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.push(opcode(op));
        frame.extend_from_slice(&body);
        let crc = crc32fast::hash(&frame[13..]);
        frame.extend_from_slice(&crc.to_le_bytes());
        while frame.len() % 8 != 0 {
            frame.push(0);
        }

        let mut file = self.file.lock().map_err(|_| StorageError::Init("wal lock poisoned".into()))?;
        file.write_all(&frame)?;
        Ok(lsn)
    }

    pub fn fsync(&self) -> Result<()> {
        let file = self.file.lock().map_err(|_| StorageError::Init("wal lock poisoned".into()))?;
        file.sync_data()?;
        Ok(())
    }

    /// Replaces the WAL with an empty file once a snapshot has durably
    /// captured everything up to `up_to_lsn`.
    pub fn reset_after_snapshot(&self, up_to_lsn: u64) -> Result<()> {
        let mut file = self.file.lock().map_err(|_| StorageError::Init("wal lock poisoned".into()))?;
        *file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .read(true)
            .append(false)
            .open(&self.path)?;
        *file = OpenOptions::new().create(true).append(true).read(true).open(&self.path)?;
        self.next_lsn.store(up_to_lsn + 1, Ordering::SeqCst);
        Ok(())
    }

    pub fn replay_from(&self, from_lsn: u64) -> Result<Vec<(u64, WalOp)>> {
        let mut out = Vec::new();
        for frame in WalReader::open(&self.path)? {
            let (lsn, op) = frame?;
            if lsn >= from_lsn {
                out.push((lsn, op));
            }
        }
        Ok(out)
    }
}

/// Sequential frame reader used both for replay and for the startup lsn scan.
/// A checksum mismatch on the final frame (the one torn write the crash model
/// allows) stops iteration silently rather than erroring; a mismatch earlier
/// in the file is a real corruption and is surfaced.
pub struct WalReader {
    reader: BufReader<File>,
    len: u64,
}

impl WalReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(WalReader {
            reader: BufReader::new(file),
            len,
        })
    }
}

impl Iterator for WalReader {
    type Item = Result<(u64, WalOp)>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = match self.reader.stream_position() {
            Ok(p) => p,
            Err(e) => return Some(Err(e.into())),
        };
        if pos >= self.len {
            return None;
        }
        match read_one_frame(&mut self.reader, self.len - pos) {
            Ok(Some((lsn, op))) => Some(Ok((lsn, op))),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

fn read_one_frame(reader: &mut BufReader<File>, remaining: u64) -> Result<Option<(u64, WalOp)>> {
    if remaining < 13 {
        return Ok(None);
    }
    let mut lsn_buf = [0u8; 8];
    let mut len_buf = [0u8; 4];
    let mut opcode_buf = [0u8; 1];
    if reader.read_exact(&mut lsn_buf).is_err() {
        return Ok(None);
    }
    reader.read_exact(&mut len_buf)?;
    reader.read_exact(&mut opcode_buf)?;
    let lsn = u64::from_le_bytes(lsn_buf);
    let body_len = u32::from_le_bytes(len_buf) as usize;
    if remaining < (13 + body_len + 4) as u64 {
        // Truncated tail frame: the one in-flight batch the crash model
        // permits to be lost.
        return Ok(None);
    }
    let mut body = vec![0u8; body_len];
    reader.read_exact(&mut body)?;
    let mut crc_buf = [0u8; 4];
    reader.read_exact(&mut crc_buf)?;
    let expected = u32::from_le_bytes(crc_buf);

    let mut check = Vec::with_capacity(1 + body.len());
    check.push(opcode_buf[0]);
    check.extend_from_slice(&body);
    let actual = crc32fast::hash(&check);
    if actual != expected {
        return Ok(None);
    }

    let pad = (8 - ((13 + body_len + 4) % 8)) % 8;
    if pad > 0 {
        let mut skip = vec![0u8; pad];
        reader.read_exact(&mut skip)?;
    }

    let op: WalOp = serde_json::from_slice(&body)?;
    Ok(Some((lsn, op)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_then_replay_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let wal = Wal::open(&path).unwrap();
        let id = NodeId::new();
        wal.append(&WalOp::Remember {
            id,
            kind: NodeKind::Episode,
            payload_bytes: b"hi".to_vec(),
            text: Some("hi".into()),
            embedding: None,
            tags: vec!["a".into()],
            provenance: None,
            tau_created: 1,
        })
        .unwrap();
        wal.append(&WalOp::Access { id }).unwrap();
        wal.fsync().unwrap();

        let replayed = wal.replay_from(0).unwrap();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].0, 0);
        assert_eq!(replayed[1].0, 1);
    }

    #[test]
    fn reopening_continues_lsn_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wal");
        {
            let wal = Wal::open(&path).unwrap();
            wal.append(&WalOp::Access { id: NodeId::new() }).unwrap();
            wal.fsync().unwrap();
        }
        let wal2 = Wal::open(&path).unwrap();
        let lsn = wal2.append(&WalOp::Access { id: NodeId::new() }).unwrap();
        assert_eq!(lsn, 1);
    }

    #[test]
    fn reset_after_snapshot_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let wal = Wal::open(&path).unwrap();
        wal.append(&WalOp::Access { id: NodeId::new() }).unwrap();
        wal.fsync().unwrap();
        wal.reset_after_snapshot(0).unwrap();
        assert!(wal.replay_from(0).unwrap().is_empty());
        let lsn = wal.append(&WalOp::Access { id: NodeId::new() }).unwrap();
        assert_eq!(lsn, 1);
    }

    #[test]
    fn truncated_tail_frame_is_dropped_not_errored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let wal = Wal::open(&path).unwrap();
        wal.append(&WalOp::Access { id: NodeId::new() }).unwrap();
        wal.fsync().unwrap();
        // Simulate a torn write: append some garbage bytes directly.
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&[1, 2, 3]).unwrap();
        }
        let replayed = wal.replay_from(0).unwrap();
        assert_eq!(replayed.len(), 1);
    }
}
