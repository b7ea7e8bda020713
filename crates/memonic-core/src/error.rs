//! Crate-wide error type. Per-subsystem errors (storage, index, retrieval)
//! live beside the code they describe and convert into this one via `#[from]`
//! at the points where an operation crosses module boundaries, mirroring the
//! per-module `thiserror` enums this codebase otherwise uses.

use thiserror::Error;

use crate::index::IndexError;
use crate::storage::StorageError;
use crate::vector::VectorError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MemonicError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("vector error: {0}")]
    Vector(#[from] VectorError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("embedder unavailable: {0}")]
    EmbedderUnavailable(String),

    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    #[error("store is in emergency read-only mode: {0}")]
    Emergency(String),

    #[error("internal invariant violation: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, MemonicError>;
