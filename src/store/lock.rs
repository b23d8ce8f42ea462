//! Filesystem-based locking for result stores
//!
//! Two runs against the same organization share one `results.json`; each holds
//! an exclusive flock() on a sidecar `results.json.lock` while it writes.

use crate::error::StoreError;
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Guard that holds an exclusive filesystem lock
///
/// The lock is released when this guard is dropped. If the process crashes,
/// the OS releases the flock.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Sidecar lock file for a store
    pub fn lock_path(store_path: &Path) -> PathBuf {
        let mut name = store_path.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Try to acquire the lock, non-blocking
    ///
    /// Returns `Ok(None)` if another process holds it.
    pub fn try_acquire(store_path: &Path) -> Result<Option<Self>, StoreError> {
        let lock_path = Self::lock_path(store_path);

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::LockFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let file = File::create(&lock_path).map_err(|e| {
            StoreError::LockFailed(format!("cannot create {}: {}", lock_path.display(), e))
        })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!("Acquired store lock {:?}", lock_path);
                Ok(Some(Self {
                    _file: file,
                    path: lock_path,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::debug!("Store lock {:?} is held by another process", lock_path);
                Ok(None)
            }
            Err(e) => Err(StoreError::LockFailed(e.to_string())),
        }
    }

    /// Acquire the lock, polling until `timeout` expires
    pub fn acquire(store_path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let start = Instant::now();
        let sleep_interval = Duration::from_millis(200);
        let mut announced = false;

        loop {
            if let Some(guard) = Self::try_acquire(store_path)? {
                return Ok(guard);
            }
            if start.elapsed() >= timeout {
                return Err(StoreError::LockFailed(format!(
                    "timed out after {:?} waiting for {}",
                    timeout,
                    Self::lock_path(store_path).display()
                )));
            }
            if !announced {
                tracing::info!(
                    "Waiting for another run to release {}",
                    store_path.display()
                );
                announced = true;
            }
            std::thread::sleep(sleep_interval);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
