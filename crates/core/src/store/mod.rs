// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value store contract required by the lock engines
//!
//! The locks never talk to a concrete store. They need exactly six
//! operations, each with its own outcome classification, and every
//! implementation (memcached, in-memory) maps its native results onto them.

mod memory;

pub use memory::{Entries, MemoryStore, StoreCall};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Opaque version returned with a fetched value, required by [`CasStore::cas`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CasToken(pub u64);

impl fmt::Display for CasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value fetched together with its version
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned {
    pub value: Vec<u8>,
    pub cas: CasToken,
}

/// Outcome of [`CasStore::add`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Created,
    AlreadyExists,
}

/// Outcome of [`CasStore::cas`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    Stored,
    /// The value changed since the paired fetch
    Conflict,
    NotFound,
}

/// Outcome of [`CasStore::append`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    NotFound,
}

/// Outcome of [`CasStore::delete`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Store operation names, used in errors and logs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Add,
    Get,
    Gets,
    Cas,
    Append,
    Delete,
}

impl StoreOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Add => "add",
            StoreOp::Get => "get",
            StoreOp::Gets => "gets",
            StoreOp::Cas => "cas",
            StoreOp::Append => "append",
            StoreOp::Delete => "delete",
        }
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport or server failures. Never a contention outcome.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("server error: {0}")]
    Server(String),
}

/// Operations a shared store must provide for the lock engines
#[async_trait]
pub trait CasStore: Send + Sync {
    /// Create `key` only if it does not exist yet
    async fn add(&self, key: &str, value: &[u8]) -> Result<AddOutcome, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Fetch a value together with its version
    async fn gets(&self, key: &str) -> Result<Option<Versioned>, StoreError>;

    /// Write `value` only if `key` is unchanged since the fetch that returned `cas`
    async fn cas(&self, key: &str, cas: CasToken, value: &[u8])
        -> Result<CasOutcome, StoreError>;

    /// Atomically append `suffix` to an existing value
    async fn append(&self, key: &str, suffix: &[u8]) -> Result<AppendOutcome, StoreError>;

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, StoreError>;
}

#[async_trait]
impl<S: CasStore + ?Sized> CasStore for Arc<S> {
    async fn add(&self, key: &str, value: &[u8]) -> Result<AddOutcome, StoreError> {
        (**self).add(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key).await
    }

    async fn gets(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        (**self).gets(key).await
    }

    async fn cas(
        &self,
        key: &str,
        cas: CasToken,
        value: &[u8],
    ) -> Result<CasOutcome, StoreError> {
        (**self).cas(key, cas, value).await
    }

    async fn append(&self, key: &str, suffix: &[u8]) -> Result<AppendOutcome, StoreError> {
        (**self).append(key, suffix).await
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, StoreError> {
        (**self).delete(key).await
    }
}
