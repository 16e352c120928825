// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CAS-guarded cell
//!
//! Wraps a single store key. Store failures become [`LockError::Store`]
//! tagged with the operation and key; outcomes are returned untouched so
//! each caller decides which of them count as contention.

use crate::error::LockError;
use crate::store::{
    AddOutcome, AppendOutcome, CasOutcome, CasStore, CasToken, DeleteOutcome, StoreOp, Versioned,
};

/// What an update closure wants done with the value it was shown
#[derive(Debug, PartialEq, Eq)]
pub enum Update<T> {
    /// Conditionally replace the value, yielding `T` if the write lands
    Write(Vec<u8>, T),
    /// Leave the value alone
    Keep(T),
}

/// Result of one optimistic update attempt
#[derive(Debug, PartialEq, Eq)]
pub enum Attempt<T> {
    Committed(T),
    Unchanged(T),
    /// Another writer got in between the fetch and the write
    Conflict,
    /// The key was absent when a write was wanted
    Missing,
}

/// A single store key
pub struct CasCell<'a, S: ?Sized> {
    store: &'a S,
    key: &'a str,
}

impl<'a, S: CasStore + ?Sized> CasCell<'a, S> {
    pub fn new(store: &'a S, key: &'a str) -> Self {
        Self { store, key }
    }

    pub fn key(&self) -> &str {
        self.key
    }

    pub async fn create_if_absent(&self, value: &[u8]) -> Result<AddOutcome, LockError> {
        self.store
            .add(self.key, value)
            .await
            .map_err(|e| LockError::store(StoreOp::Add, self.key, e))
    }

    pub async fn fetch(&self) -> Result<Option<Vec<u8>>, LockError> {
        self.store
            .get(self.key)
            .await
            .map_err(|e| LockError::store(StoreOp::Get, self.key, e))
    }

    pub async fn fetch_versioned(&self) -> Result<Option<Versioned>, LockError> {
        self.store
            .gets(self.key)
            .await
            .map_err(|e| LockError::store(StoreOp::Gets, self.key, e))
    }

    pub async fn write_if_unchanged(
        &self,
        cas: CasToken,
        value: &[u8],
    ) -> Result<CasOutcome, LockError> {
        self.store
            .cas(self.key, cas, value)
            .await
            .map_err(|e| LockError::store(StoreOp::Cas, self.key, e))
    }

    pub async fn append(&self, suffix: &[u8]) -> Result<AppendOutcome, LockError> {
        self.store
            .append(self.key, suffix)
            .await
            .map_err(|e| LockError::store(StoreOp::Append, self.key, e))
    }

    pub async fn delete(&self) -> Result<DeleteOutcome, LockError> {
        self.store
            .delete(self.key)
            .await
            .map_err(|e| LockError::store(StoreOp::Delete, self.key, e))
    }

    /// Fetch, let `f` decide, and conditionally commit. One attempt.
    ///
    /// `f` sees `None` when the key is absent; asking to write in that case
    /// yields [`Attempt::Missing`] without touching the store.
    pub async fn try_update<T, F>(&self, f: F) -> Result<Attempt<T>, LockError>
    where
        F: FnOnce(Option<&[u8]>) -> Result<Update<T>, LockError> + Send,
        T: Send,
    {
        let Some(current) = self.fetch_versioned().await? else {
            return Ok(match f(None)? {
                Update::Keep(t) => Attempt::Unchanged(t),
                Update::Write(..) => Attempt::Missing,
            });
        };

        match f(Some(&current.value))? {
            Update::Keep(t) => Ok(Attempt::Unchanged(t)),
            Update::Write(value, t) => {
                match self.write_if_unchanged(current.cas, &value).await? {
                    CasOutcome::Stored => Ok(Attempt::Committed(t)),
                    CasOutcome::Conflict => Ok(Attempt::Conflict),
                    CasOutcome::NotFound => Ok(Attempt::Missing),
                }
            }
        }
    }

    /// [`CasCell::try_update`] repeated until it does not conflict.
    /// Never returns [`Attempt::Conflict`].
    pub async fn update<T, F>(&self, mut f: F) -> Result<Attempt<T>, LockError>
    where
        F: FnMut(Option<&[u8]>) -> Result<Update<T>, LockError> + Send,
        T: Send,
    {
        let mut conflicts: u32 = 0;
        loop {
            match self.try_update(&mut f).await? {
                Attempt::Conflict => {
                    conflicts += 1;
                    tracing::trace!(key = self.key, conflicts, "cas conflict, retrying");
                }
                attempt => return Ok(attempt),
            }
        }
    }
}

#[cfg(test)]
#[path = "cell_tests.rs"]
mod tests;
