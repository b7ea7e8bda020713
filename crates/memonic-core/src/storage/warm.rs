//! The warm tier: a memory-mapped, append-only slab of quantized embeddings.
//! Record layout (little-endian): `u128 id | u32 dim | dim bytes i8 data |
//! f32 scale | f32 offset`. Reads go through an `mmap`; writes are plain
//! appends followed by a remap so concurrent readers see the new tail.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::RwLock;

use memmap2::{Mmap, MmapOptions};

use crate::id::NodeId;
use crate::vector::QuantizedVector;

use super::error::Result;

const HEADER_LEN: usize = 16 + 4;
const FOOTER_LEN: usize = 4 + 4;

pub struct WarmSlab {
    file: RwLock<File>,
    mmap: RwLock<Option<Mmap>>,
}

impl WarmSlab {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let slab = WarmSlab {
            file: RwLock::new(file),
            mmap: RwLock::new(None),
        };
        slab.remap()?;
        Ok(slab)
    }

    fn remap(&self) -> Result<()> {
        let file = self.file.read().expect("warm slab file lock poisoned");
        let len = file.metadata()?.len();
        let mut mmap_guard = self.mmap.write().expect("warm slab mmap lock poisoned");
        *mmap_guard = if len == 0 {
            None
        } else {
            Some(unsafe { MmapOptions::new().map(&*file)? })
        };
        Ok(())
    }

    /// Appends a record and returns its byte offset, the key cold-tier
    /// metadata stores to find it again after a restart.
    pub fn append(&self, id: NodeId, vector: &QuantizedVector) -> Result<u64> {
        let mut buf = Vec::with_capacity(HEADER_LEN + vector.dim() + FOOTER_LEN);
        buf.extend_from_slice(&id.0.to_le_bytes());
        buf.extend_from_slice(&(vector.dim() as u32).to_le_bytes());
        buf.extend(vector.data.iter().map(|b| *b as u8));
        buf.extend_from_slice(&vector.scale.to_le_bytes());
        buf.extend_from_slice(&vector.offset.to_le_bytes());

        let offset = {
            let mut file = self.file.write().expect("warm slab file lock poisoned");
            let offset = file.metadata()?.len();
            file.write_all(&buf)?;
            file.sync_data()?;
            offset
        };
        self.remap()?;
        Ok(offset)
    }

    pub fn read_at(&self, offset: u64) -> Result<Option<(NodeId, QuantizedVector)>> {
        let mmap_guard = self.mmap.read().expect("warm slab mmap lock poisoned");
        let Some(mmap) = mmap_guard.as_ref() else {
            return Ok(None);
        };
        let offset = offset as usize;
        if offset + HEADER_LEN > mmap.len() {
            return Ok(None);
        }
        let id_bytes: [u8; 16] = mmap[offset..offset + 16].try_into().unwrap();
        let id = NodeId(u128::from_le_bytes(id_bytes));
        let dim_bytes: [u8; 4] = mmap[offset + 16..offset + 20].try_into().unwrap();
        let dim = u32::from_le_bytes(dim_bytes) as usize;
        let data_start = offset + HEADER_LEN;
        let data_end = data_start + dim;
        if data_end + FOOTER_LEN > mmap.len() {
            return Ok(None);
        }
        let data = mmap[data_start..data_end].iter().map(|b| *b as i8).collect();
        let scale = f32::from_le_bytes(mmap[data_end..data_end + 4].try_into().unwrap());
        let off = f32::from_le_bytes(mmap[data_end + 4..data_end + 8].try_into().unwrap());
        Ok(Some((
            id,
            QuantizedVector {
                data,
                scale,
                offset: off,
            },
        )))
    }

    pub fn len_bytes(&self) -> Result<u64> {
        let file = self.file.read().expect("warm slab file lock poisoned");
        Ok(file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector;

    #[test]
    fn append_then_read_back_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warm.slab");
        let slab = WarmSlab::open(&path).unwrap();
        let id = NodeId::new();
        let qv = Vector(vec![0.1, 0.5, -0.3, 0.9]).quantize();

        let offset = slab.append(id, &qv).unwrap();
        let (read_id, read_qv) = slab.read_at(offset).unwrap().unwrap();
        assert_eq!(read_id, id);
        assert_eq!(read_qv.data, qv.data);
        assert_eq!(read_qv.scale, qv.scale);
    }

    #[test]
    fn multiple_appends_preserve_earlier_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warm.slab");
        let slab = WarmSlab::open(&path).unwrap();
        let a_id = NodeId::new();
        let b_id = NodeId::new();
        let a_vec = Vector(vec![1.0, 2.0]).quantize();
        let b_vec = Vector(vec![-1.0, 0.5, 0.25]).quantize();

        let a_off = slab.append(a_id, &a_vec).unwrap();
        let b_off = slab.append(b_id, &b_vec).unwrap();

        assert_eq!(slab.read_at(a_off).unwrap().unwrap().0, a_id);
        assert_eq!(slab.read_at(b_off).unwrap().unwrap().0, b_id);
    }

    #[test]
    fn read_past_end_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warm.slab");
        let slab = WarmSlab::open(&path).unwrap();
        assert!(slab.read_at(9999).unwrap().is_none());
    }
}
