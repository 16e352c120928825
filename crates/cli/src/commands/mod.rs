// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod destroy;
pub mod inspect;
pub mod run;

use anyhow::Result;
use clap::{Args, ValueEnum};
use slock_adapters::{FileLock, MemcachedStore, TracedStore};
use slock_core::{Config, FifoQueueLock, SemaphoreLock, SessionLock};
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LockKind {
    /// Mutex granted in arrival order
    Fifo,
    /// Counting lock with a fixed number of permits
    Semaphore,
    /// Host-local OS file lock
    File,
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockKind::Fifo => "fifo",
            LockKind::Semaphore => "semaphore",
            LockKind::File => "file",
        };
        f.write_str(name)
    }
}

/// Which lock, and for which session
#[derive(Args)]
pub struct LockArgs {
    /// Lock implementation
    #[arg(long, value_enum)]
    pub lock: LockKind,

    /// Session id to lock
    #[arg(long)]
    pub session: String,

    /// Directory for file locks, overriding the config file
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

impl LockArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.dir {
            config.file.dir = Some(dir.clone());
        }
    }
}

pub fn store(config: &Config) -> TracedStore<MemcachedStore> {
    TracedStore::new(MemcachedStore::from_settings(&config.store))
}

pub fn build_lock(kind: LockKind, config: &Config) -> Result<Box<dyn SessionLock>> {
    let lock: Box<dyn SessionLock> = match kind {
        LockKind::Fifo => Box::new(FifoQueueLock::with_config(store(config), config.fifo.clone())),
        LockKind::Semaphore => Box::new(SemaphoreLock::with_config(
            store(config),
            config.semaphore.clone(),
        )),
        LockKind::File => Box::new(FileLock::new(config.file.dir_or_temp())?),
    };
    tracing::debug!(%kind, "built lock");
    Ok(lock)
}
