// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore lock
//!
//! The cell `semaphore_<session>` holds the number of free permits as ASCII
//! decimal. It is created lazily with the configured permit count. Acquiring
//! decrements it under CAS and then re-reads it to confirm the write stuck;
//! releasing increments it using the version seen at that confirmation.

use super::cell::{Attempt, CasCell, Update};
use super::{semaphore_key, SessionLock, DEFAULT_POLL_INTERVAL};
use crate::error::LockError;
use crate::store::{CasOutcome, CasStore, CasToken, DeleteOutcome};
use async_trait::async_trait;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Semaphore configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemaphoreConfig {
    /// Permits the cell starts with when it is first created. At least one.
    #[serde(deserialize_with = "at_least_one")]
    pub permits: u32,
    /// Pause between polls while no permit is free
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

fn at_least_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let permits = u32::deserialize(deserializer)?;
    if permits == 0 {
        return Err(D::Error::custom("permits must be at least 1"));
    }
    Ok(permits)
}

impl SemaphoreConfig {
    /// Zero permits would leave every waiter polling forever, so it becomes one
    pub fn new(permits: u32) -> Self {
        Self {
            permits: permits.max(1),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            permits: 1,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A permit taken by `acquire`, with the version that confirmed it
#[derive(Clone, Debug, PartialEq, Eq)]
struct Held {
    key: String,
    value: i64,
    cas: CasToken,
}

/// Outcome of one pass through the acquire protocol
enum Pass {
    Acquired(Held),
    /// No permit free; wait before the next pass
    Exhausted,
    /// Lost a race; go again straight away
    Retry,
}

/// Counting lock over a shared store
pub struct SemaphoreLock<S> {
    store: S,
    config: SemaphoreConfig,
    held: Option<Held>,
}

fn encode(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

fn decode(key: &str, value: &[u8]) -> Result<i64, LockError> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| LockError::Corrupt {
            key: key.to_string(),
            reason: format!("not a permit count: {:?}", String::from_utf8_lossy(value)),
        })
}

impl<S: CasStore> SemaphoreLock<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, SemaphoreConfig::default())
    }

    pub fn with_config(store: S, mut config: SemaphoreConfig) -> Self {
        if config.permits == 0 {
            tracing::warn!("semaphore configured with zero permits, using one");
            config.permits = 1;
        }
        Self {
            store,
            config,
            held: None,
        }
    }

    pub fn config(&self) -> &SemaphoreConfig {
        &self.config
    }

    /// Whether this instance currently holds a permit
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    async fn pass(&self, key: &str) -> Result<Pass, LockError> {
        let cell = CasCell::new(&self.store, key);
        cell.create_if_absent(&encode(i64::from(self.config.permits)))
            .await?;

        let attempt = cell
            .try_update(|value| match value {
                None => Ok(Update::Keep(None)),
                Some(value) => {
                    let free = decode(key, value)?;
                    if free < 1 {
                        Ok(Update::Keep(Some(free)))
                    } else {
                        Ok(Update::Write(encode(free - 1), Some(free - 1)))
                    }
                }
            })
            .await?;

        let expected = match attempt {
            Attempt::Committed(Some(expected)) => expected,
            Attempt::Committed(None) | Attempt::Unchanged(_) => return Ok(Pass::Exhausted),
            Attempt::Conflict | Attempt::Missing => {
                tracing::trace!(key, "lost decrement race");
                return Ok(Pass::Retry);
            }
        };

        // The version captured here is the one release writes against
        let Some(current) = cell.fetch_versioned().await? else {
            tracing::debug!(key, "cell vanished after decrement");
            return Ok(Pass::Retry);
        };
        let seen = decode(key, &current.value)?;
        if seen != expected {
            tracing::debug!(key, expected, seen, "cell changed after decrement");
            return Ok(Pass::Retry);
        }

        Ok(Pass::Acquired(Held {
            key: key.to_string(),
            value: seen,
            cas: current.cas,
        }))
    }

    /// Increment under CAS until it lands, never exceeding the configured
    /// permit count
    async fn give_back(&self, key: &str) -> Result<(), LockError> {
        let permits = i64::from(self.config.permits);
        let attempt = CasCell::new(&self.store, key)
            .update(|value| match value {
                None => Ok(Update::Keep(())),
                Some(value) => {
                    let free = decode(key, value)?;
                    if free >= permits {
                        Ok(Update::Keep(()))
                    } else {
                        Ok(Update::Write(encode(free + 1), ()))
                    }
                }
            })
            .await?;

        match attempt {
            Attempt::Committed(()) => tracing::info!(key, "released after retry"),
            _ => tracing::warn!(key, "permit increment dropped"),
        }
        Ok(())
    }
}

#[async_trait]
impl<S: CasStore> SessionLock for SemaphoreLock<S> {
    async fn acquire(&mut self, session_id: &str) -> Result<(), LockError> {
        let key = semaphore_key(session_id);
        let mut passes: u32 = 0;
        loop {
            passes += 1;
            match self.pass(&key).await? {
                Pass::Acquired(held) => {
                    tracing::info!(key = %key, free = held.value, passes, "acquired");
                    self.held = Some(held);
                    return Ok(());
                }
                Pass::Exhausted => {
                    tracing::trace!(key = %key, "no permit free");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Pass::Retry => {}
            }
        }
    }

    async fn release(&mut self) -> Result<(), LockError> {
        let Some(held) = self.held.take() else {
            tracing::debug!("release without a held permit");
            return Ok(());
        };

        let cell = CasCell::new(&self.store, &held.key);
        match cell
            .write_if_unchanged(held.cas, &encode(held.value + 1))
            .await?
        {
            CasOutcome::Stored => {
                tracing::info!(key = %held.key, "released");
            }
            CasOutcome::Conflict if self.config.permits > 1 => {
                tracing::debug!(key = %held.key, "release raced, retrying increment");
                self.give_back(&held.key).await?;
            }
            CasOutcome::Conflict | CasOutcome::NotFound => {
                tracing::warn!(key = %held.key, "permit increment dropped");
            }
        }
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), LockError> {
        let key = semaphore_key(session_id);
        match CasCell::new(&self.store, &key).delete().await? {
            DeleteOutcome::Deleted => tracing::info!(key = %key, "destroyed semaphore"),
            DeleteOutcome::NotFound => tracing::debug!(key = %key, "semaphore already absent"),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
