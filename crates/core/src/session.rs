// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locked session storage
//!
//! Wraps any session backend so that everything between `open` and `close`
//! runs while holding the session's lock.

use crate::coordination::SessionLock;
use crate::error::LockError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("session backend: {0}")]
    Backend(String),
}

/// Session data storage, e.g. files or a database table
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn open(&mut self, save_path: &Path, name: &str) -> Result<(), SessionError>;
    async fn close(&mut self) -> Result<(), SessionError>;
    async fn read(&mut self, id: &str) -> Result<Option<Vec<u8>>, SessionError>;
    async fn write(&mut self, id: &str, data: &[u8]) -> Result<(), SessionError>;
    async fn destroy(&mut self, id: &str) -> Result<(), SessionError>;
    /// Remove sessions idle for longer than `max_lifetime`, returning how many
    async fn gc(&mut self, max_lifetime: Duration) -> Result<usize, SessionError>;
}

/// A session backend guarded by a [`SessionLock`]
pub struct LockedSession<B, L> {
    backend: B,
    lock: L,
    open_session: Option<String>,
}

impl<B: SessionBackend, L: SessionLock> LockedSession<B, L> {
    pub fn new(backend: B, lock: L) -> Self {
        Self {
            backend,
            lock,
            open_session: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn lock(&self) -> &L {
        &self.lock
    }

    /// Session currently open, if any
    pub fn open_session(&self) -> Option<&str> {
        self.open_session.as_deref()
    }

    /// Take the lock for `session_id`, then open the backend.
    /// The lock is given back if the backend fails to open.
    pub async fn open(
        &mut self,
        session_id: &str,
        save_path: &Path,
        name: &str,
    ) -> Result<(), SessionError> {
        self.lock.acquire(session_id).await?;

        if let Err(e) = self.backend.open(save_path, name).await {
            if let Err(release) = self.lock.release().await {
                tracing::warn!(session_id, error = %release, "release after failed open");
            }
            return Err(e);
        }

        tracing::debug!(session_id, "session opened");
        self.open_session = Some(session_id.to_string());
        Ok(())
    }

    /// Close the backend, then release the lock. The lock is released even
    /// when close fails, and the close error wins.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        let closed = self.backend.close().await;
        let released = self.lock.release().await;
        if let Some(session_id) = self.open_session.take() {
            tracing::debug!(session_id = %session_id, "session closed");
        }
        closed?;
        released?;
        Ok(())
    }

    pub async fn read(&mut self, id: &str) -> Result<Option<Vec<u8>>, SessionError> {
        self.backend.read(id).await
    }

    pub async fn write(&mut self, id: &str, data: &[u8]) -> Result<(), SessionError> {
        self.backend.write(id, data).await
    }

    /// Drop the lock state for `id`, then its data
    pub async fn destroy(&mut self, id: &str) -> Result<(), SessionError> {
        self.lock.destroy(id).await?;
        self.backend.destroy(id).await
    }

    pub async fn gc(&mut self, max_lifetime: Duration) -> Result<usize, SessionError> {
        let removed = self.backend.gc(max_lifetime).await?;
        if removed > 0 {
            tracing::info!(removed, "collected expired sessions");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
