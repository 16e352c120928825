// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lock operations

use crate::store::{StoreError, StoreOp};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal coordination errors.
///
/// Contention (version conflicts, a missing key where absence is expected,
/// an already existing key) is handled inside the engines and never shows
/// up here.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("store {op} on {key:?} failed: {source}")]
    Store {
        op: StoreOp,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("store {op} on {key:?} returned unexpected outcome: {outcome}")]
    Unexpected {
        op: StoreOp,
        key: String,
        outcome: String,
    },
    #[error("corrupt value in {key:?}: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("invalid lock directory {}: {reason}", path.display())]
    InvalidDirectory { path: PathBuf, reason: String },
    #[error("lock file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    pub(crate) fn store(op: StoreOp, key: &str, source: StoreError) -> Self {
        LockError::Store {
            op,
            key: key.to_string(),
            source,
        }
    }

    /// True for failures of the store itself, as opposed to bad state in it
    pub fn is_store_failure(&self) -> bool {
        matches!(self, LockError::Store { .. })
    }
}
