use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("(de)serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("WAL corruption at lsn {lsn}: {reason}")]
    WalCorruption { lsn: u64, reason: String },
    #[error("snapshot corruption: {0}")]
    SnapshotCorruption(String),
    #[error("store is in emergency read-only mode")]
    Emergency,
    #[error("initialization error: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
