//! Tiered storage: Hot (full records in RAM), Warm (mmap'd quantized
//! embeddings + on-disk metadata), Cold (on-disk metadata only), plus the
//! write-ahead log and generation-numbered snapshots that make the whole
//! thing durable and crash-recoverable.

mod cold;
mod error;
mod hot;
mod snapshot;
mod store;
mod wal;
mod warm;

pub use cold::{ColdMeta, ColdRecord};
pub use error::{Result, StorageError};
pub use snapshot::{SnapshotHeader, STORE_FORMAT_VERSION};
pub use store::{StoreConfig, TieredStore};
pub use wal::{Wal, WalOp};
