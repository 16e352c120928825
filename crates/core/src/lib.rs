// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! slock-core: session locks over a shared CAS key-value store
//!
//! This crate provides:
//! - The [`CasStore`] contract and an in-memory store for tests
//! - A FIFO queue lock and a semaphore lock built on one CAS-guarded cell
//! - A session adapter that holds the lock between open and close
//! - Lock configuration loaded from TOML

pub mod clock;
pub mod config;
pub mod coordination;
pub mod error;
pub mod queue;
pub mod session;
pub mod store;
pub mod token;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, FileSettings, StoreSettings};
pub use coordination::{
    fifo_key, semaphore_key, FifoConfig, FifoQueueLock, SemaphoreConfig, SemaphoreLock,
    SessionLock,
};
pub use error::LockError;
pub use queue::TokenQueue;
pub use session::{LockedSession, SessionBackend, SessionError};
pub use store::{
    AddOutcome, AppendOutcome, CasOutcome, CasStore, CasToken, DeleteOutcome, MemoryStore,
    StoreError, StoreOp, Versioned,
};
pub use token::{RandomTokenGen, SequentialTokenGen, Token, TokenGen, TOKEN_SIZE};
