//! Exclusive daemon-instance lock at `P.lock` (§6): prevents two daemon
//! processes from serving the same store concurrently.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("another daemon already holds the lock at {0}")]
    AlreadyLocked(PathBuf),
    #[error("io error opening lock file {0}: {1}")]
    Io(PathBuf, std::io::Error),
}

/// Held for the daemon process's lifetime; dropping it releases the lock.
/// The `RwLock` is leaked to `'static` so the write guard (which borrows it)
/// can live alongside it in this struct rather than in a scope that ends
/// before the daemon does.
pub struct InstanceLock {
    _guard: fd_lock::RwLockWriteGuard<'static, File>,
    path: PathBuf,
}

impl InstanceLock {
    /// Tries to acquire the exclusive lock at `<store_path>.lock`,
    /// non-blocking — a second daemon against the same store fails fast
    /// rather than queuing behind the first.
    pub fn acquire(store_path: &Path) -> Result<Self, LockError> {
        let path = lock_path(store_path);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| LockError::Io(path.clone(), e))?;
        let lock: &'static mut RwLock<File> = Box::leak(Box::new(RwLock::new(file)));
        let guard = lock.try_write().map_err(|_| LockError::AlreadyLocked(path.clone()))?;
        Ok(InstanceLock { _guard: guard, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(store_path: &Path) -> PathBuf {
    let mut name = store_path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}
