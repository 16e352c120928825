// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session locks coordinated through a shared CAS store
//!
//! This module provides:
//! - **CasCell** - One store key with the fetch/compute/commit/retry combinator
//! - **FifoQueueLock** - Mutex granting the lock in arrival order, with stale-head eviction
//! - **SemaphoreLock** - Permit counter guarded by CAS
//! - **SessionLock** - The acquire/release/destroy contract every lock implements

pub mod cell;
pub mod fifo;
pub mod semaphore;

pub use cell::{Attempt, CasCell, Update};
pub use fifo::{FifoConfig, FifoQueueLock};
pub use semaphore::{SemaphoreConfig, SemaphoreLock};

use crate::error::LockError;
use async_trait::async_trait;
use std::time::Duration;

/// Default pause between polls while waiting for a lock
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub const FIFO_KEY_PREFIX: &str = "fifo_queue_";
pub const SEMAPHORE_KEY_PREFIX: &str = "semaphore_";

/// Store key of the FIFO queue for a session
pub fn fifo_key(session_id: &str) -> String {
    format!("{}{}", FIFO_KEY_PREFIX, session_id)
}

/// Store key of the semaphore cell for a session
pub fn semaphore_key(session_id: &str) -> String {
    format!("{}{}", SEMAPHORE_KEY_PREFIX, session_id)
}

/// Exclusive access to a session, shared by every lock flavour.
///
/// One instance is one waiter: `acquire` and `release` take `&mut self`, so a
/// single instance can never hold two overlapping acquisitions.
#[async_trait]
pub trait SessionLock: Send + Sync {
    /// Block until this instance holds the lock for `session_id`
    async fn acquire(&mut self, session_id: &str) -> Result<(), LockError>;

    /// Release the most recently acquired lock. Safe to call when the lock
    /// state was invalidated externally, or when nothing is held.
    async fn release(&mut self) -> Result<(), LockError>;

    /// Withdraw after an `acquire` was cancelled part way, dropping any
    /// claim it left in the store. Also releases a held lock.
    async fn leave(&mut self) -> Result<(), LockError> {
        self.release().await
    }

    /// Remove all lock state for `session_id`. Idempotent.
    async fn destroy(&self, session_id: &str) -> Result<(), LockError>;
}

#[async_trait]
impl<L: SessionLock + ?Sized> SessionLock for Box<L> {
    async fn acquire(&mut self, session_id: &str) -> Result<(), LockError> {
        (**self).acquire(session_id).await
    }

    async fn release(&mut self) -> Result<(), LockError> {
        (**self).release().await
    }

    async fn leave(&mut self) -> Result<(), LockError> {
        (**self).leave().await
    }

    async fn destroy(&self, session_id: &str) -> Result<(), LockError> {
        (**self).destroy(session_id).await
    }
}
