//! Advisory lock serializing read-modify-write sequences on one container
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::fcntl::{flock, FlockArg};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("failed to open lock file {path:?}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to lock {path:?}")]
    Flock { path: PathBuf, source: nix::Error },
}

/// Exclusive `flock` on `<container>/state.lock`, released when dropped.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    const LOCK_FILE_PATH: &'static str = "state.lock";

    /// Blocks until the lock for `container_root` is acquired.
    pub fn acquire(container_root: &Path) -> Result<Self, LockError> {
        let path = container_root.join(Self::LOCK_FILE_PATH);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                tracing::error!(?path, %err, "failed to open lock file");
                LockError::Open {
                    path: path.to_owned(),
                    source: err,
                }
            })?;

        loop {
            match flock(file.as_raw_fd(), FlockArg::LockExclusive) {
                Ok(()) => break,
                Err(nix::Error::EINTR) => continue,
                Err(err) => {
                    tracing::error!(?path, %err, "failed to lock container");
                    return Err(LockError::Flock { path, source: err });
                }
            }
        }

        tracing::trace!(?path, "container locked");
        Ok(Self { file, path })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(err) = flock(self.file.as_raw_fd(), FlockArg::Unlock) {
            tracing::warn!(path = ?self.path, %err, "failed to unlock container");
        }
    }
}
