// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `slock inspect` - Show the raw lock state for a session

use super::store;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use slock_core::{fifo_key, semaphore_key, CasStore, Config, TokenQueue};

/// Locks whose state lives in the shared store
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoredLock {
    Fifo,
    Semaphore,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Lock implementation
    #[arg(long, value_enum)]
    pub lock: StoredLock,

    /// Session id to inspect
    #[arg(long)]
    pub session: String,
}

pub async fn inspect(args: InspectArgs, config: Config) -> Result<()> {
    let store = store(&config);
    let key = match args.lock {
        StoredLock::Fifo => fifo_key(&args.session),
        StoredLock::Semaphore => semaphore_key(&args.session),
    };

    let value = store
        .get(&key)
        .await
        .with_context(|| format!("reading {key}"))?;
    println!("{}", describe(args.lock, &key, value.as_deref()));
    Ok(())
}

fn describe(lock: StoredLock, key: &str, value: Option<&[u8]>) -> String {
    let Some(value) = value else {
        return format!("{key}: absent");
    };
    match lock {
        StoredLock::Fifo => {
            let queue = TokenQueue::new(value);
            match queue.head() {
                Some(head) => format!("{key}: {} queued, head {head}", queue.len()),
                None => format!("{key}: 0 queued"),
            }
        }
        StoredLock::Semaphore => format!(
            "{key}: {} permits free",
            String::from_utf8_lossy(value).trim()
        ),
    }
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
