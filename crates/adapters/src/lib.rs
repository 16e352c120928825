// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: the memcached store and host-local file locks

pub mod file;
pub mod memcached;
pub mod traced;

pub use file::FileLock;
pub use memcached::MemcachedStore;
pub use traced::TracedStore;
