// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-local session lock on an OS file lock
//!
//! One file per session under a fixed directory. Only serializes processes
//! on the same host.

use async_trait::async_trait;
use fs2::FileExt;
use slock_core::coordination::DEFAULT_POLL_INTERVAL;
use slock_core::{LockError, SessionLock};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct FileLock {
    dir: PathBuf,
    poll_interval: Duration,
    held: Option<(PathBuf, File)>,
}

impl FileLock {
    /// `dir` must be an existing, writable directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, LockError> {
        let dir = dir.into();
        let invalid = |reason: &str| LockError::InvalidDirectory {
            path: dir.clone(),
            reason: reason.to_string(),
        };

        let meta = match std::fs::metadata(&dir) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(invalid("does not exist")),
            Err(e) => return Err(invalid(&e.to_string())),
        };
        if !meta.is_dir() {
            return Err(invalid("not a directory"));
        }
        if meta.permissions().readonly() {
            return Err(invalid("not writable"));
        }

        Ok(Self {
            dir,
            poll_interval: DEFAULT_POLL_INTERVAL,
            held: None,
        })
    }

    /// Pause between attempts while another holder has the file locked
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Lock file for a session. Ids that would leave the directory are refused.
    pub fn path_for(&self, session_id: &str) -> Result<PathBuf, LockError> {
        let escapes = session_id.is_empty()
            || session_id == "."
            || session_id == ".."
            || session_id.contains(['/', '\\', '\0']);
        if escapes {
            return Err(LockError::File {
                path: self.dir.join(session_id),
                source: io::Error::new(io::ErrorKind::InvalidInput, "invalid session id"),
            });
        }
        Ok(self.dir.join(session_id))
    }

    fn unlock(path: &Path, file: &File) -> Result<(), LockError> {
        FileExt::unlock(file).map_err(|source| LockError::File {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl SessionLock for FileLock {
    async fn acquire(&mut self, session_id: &str) -> Result<(), LockError> {
        let path = self.path_for(session_id)?;

        // A second flock on the same file from this process would block forever
        if let Some((previous, file)) = self.held.take() {
            tracing::debug!(path = %previous.display(), "releasing before re-acquire");
            Self::unlock(&previous, &file)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| LockError::File {
                path: path.clone(),
                source,
            })?;

        // Poll rather than block so a cancelled acquire stops waiting
        let contended = fs2::lock_contended_error().kind();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if e.kind() == contended => {
                    tracing::trace!(path = %path.display(), "lock file busy");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(source) => return Err(LockError::File { path, source }),
            }
        }

        tracing::info!(path = %path.display(), "acquired");
        self.held = Some((path, file));
        Ok(())
    }

    async fn release(&mut self) -> Result<(), LockError> {
        let Some((path, file)) = self.held.take() else {
            tracing::debug!("release without a held file lock");
            return Ok(());
        };
        Self::unlock(&path, &file)?;
        tracing::info!(path = %path.display(), "released");
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), LockError> {
        let path = self.path_for(session_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed lock file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::File { path, source }),
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
