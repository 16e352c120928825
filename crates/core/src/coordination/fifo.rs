// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIFO queue lock
//!
//! Waiters append their token to a queue stored under `fifo_queue_<session>`
//! and poll until the token reaches the front. The holder releases by
//! conditionally writing the queue minus its head. A waiter whose token
//! disappears (flush, eviction, overwrite) rejoins at the back with the same
//! token. Optionally, a head that sits unchanged for too long is evicted so
//! a crashed holder cannot block the queue forever.

use super::cell::{Attempt, CasCell, Update};
use super::{fifo_key, SessionLock, DEFAULT_POLL_INTERVAL};
use crate::clock::{Clock, SystemClock};
use crate::error::LockError;
use crate::queue::TokenQueue;
use crate::store::{AddOutcome, AppendOutcome, CasStore, DeleteOutcome, StoreOp};
use crate::token::{RandomTokenGen, Token, TokenGen};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// FIFO lock configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FifoConfig {
    /// Evict a queue head that stays unchanged for longer than this.
    /// Zero disables eviction.
    #[serde(with = "humantime_serde")]
    pub stale_after: Duration,
    /// Pause between queue polls while waiting
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl FifoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn evicts_stale_heads(&self) -> bool {
        !self.stale_after.is_zero()
    }
}

impl Default for FifoConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::ZERO,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Mutex over a shared store that grants the lock in arrival order
pub struct FifoQueueLock<S, C = SystemClock> {
    store: S,
    clock: C,
    config: FifoConfig,
    token: Token,
    /// Queue of the most recent acquire, used by release
    queue_key: Option<String>,
    /// Head seen at the front of the queue, and since when
    watched_head: Option<(Token, Instant)>,
}

impl<S: CasStore> FifoQueueLock<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, FifoConfig::default())
    }

    pub fn with_config(store: S, config: FifoConfig) -> Self {
        Self::build(store, config, SystemClock, &RandomTokenGen)
    }
}

impl<S: CasStore, C: Clock> FifoQueueLock<S, C> {
    /// Create a lock with an explicit clock and token source.
    /// The token is drawn once and reused for every acquisition.
    pub fn build(store: S, config: FifoConfig, clock: C, tokens: &impl TokenGen) -> Self {
        Self {
            store,
            clock,
            config,
            token: tokens.next(),
            queue_key: None,
            watched_head: None,
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn config(&self) -> &FifoConfig {
        &self.config
    }

    /// Key of the queue this instance last acquired
    pub fn queue_key(&self) -> Option<&str> {
        self.queue_key.as_deref()
    }

    /// Create the queue holding only our token, or append to the existing one
    async fn join(&self, key: &str) -> Result<(), LockError> {
        let cell = CasCell::new(&self.store, key);
        match cell.create_if_absent(self.token.as_bytes()).await? {
            AddOutcome::Created => {
                tracing::debug!(key, "created queue");
                Ok(())
            }
            AddOutcome::AlreadyExists => match cell.append(self.token.as_bytes()).await? {
                AppendOutcome::Appended => Ok(()),
                AppendOutcome::NotFound => Err(LockError::Unexpected {
                    op: StoreOp::Append,
                    key: key.to_string(),
                    outcome: "not found after add reported the queue exists".to_string(),
                }),
            },
        }
    }

    async fn position(&self, key: &str) -> Result<Option<usize>, LockError> {
        let value = CasCell::new(&self.store, key).fetch().await?;
        Ok(TokenQueue::from_value(value.as_deref()).position(&self.token))
    }

    /// Pop the queue head if it has been at the front for longer than
    /// `stale_after`. Losing the race to another waiter is fine.
    async fn evict_stale_head(&mut self, key: &str) -> Result<(), LockError> {
        if !self.config.evicts_stale_heads() {
            return Ok(());
        }

        let stale_after = self.config.stale_after;
        let clock = &self.clock;
        let watched = &mut self.watched_head;
        let cell = CasCell::new(&self.store, key);

        let attempt = cell
            .try_update(|value| {
                let queue = TokenQueue::from_value(value);
                let Some(head) = queue.head() else {
                    return Ok(Update::Keep(None));
                };

                let now = clock.now();
                let unchanged_for = match *watched {
                    Some((seen, since)) if seen == head => now.duration_since(since),
                    _ => {
                        *watched = Some((head, now));
                        Duration::ZERO
                    }
                };

                if unchanged_for > stale_after {
                    Ok(Update::Write(
                        queue.without_head().to_vec(),
                        Some((head, unchanged_for)),
                    ))
                } else {
                    Ok(Update::Keep(None))
                }
            })
            .await?;

        match attempt {
            Attempt::Committed(Some((head, unchanged_for))) => {
                tracing::warn!(
                    key,
                    head = %head,
                    unchanged_ms = unchanged_for.as_millis() as u64,
                    "evicted stale queue head"
                );
                self.watched_head = None;
            }
            Attempt::Conflict | Attempt::Missing => {
                tracing::debug!(key, "stale head changed before eviction")
            }
            Attempt::Committed(None) | Attempt::Unchanged(_) => {}
        }

        Ok(())
    }
}

#[async_trait]
impl<S: CasStore, C: Clock> SessionLock for FifoQueueLock<S, C> {
    async fn acquire(&mut self, session_id: &str) -> Result<(), LockError> {
        let key = fifo_key(session_id);
        self.queue_key = Some(key.clone());
        self.watched_head = None;

        // A cancelled wait may have left our token queued; joining again
        // would put a second copy behind it
        let mut position = self.position(&key).await?;
        if position.is_some() {
            tracing::debug!(key = %key, token = %self.token, ?position, "token already queued");
        }

        let mut joins: u32 = 0;
        loop {
            if position.is_none() {
                self.join(&key).await?;
                joins += 1;
                position = self.position(&key).await?;
                tracing::debug!(key = %key, token = %self.token, ?position, joins, "joined queue");
            }

            while matches!(position, Some(p) if p > 0) {
                tokio::time::sleep(self.config.poll_interval).await;
                self.evict_stale_head(&key).await?;
                position = self.position(&key).await?;
                tracing::trace!(key = %key, ?position, "polled queue");
            }

            if position == Some(0) {
                tracing::info!(key = %key, token = %self.token, joins, "acquired");
                self.watched_head = None;
                return Ok(());
            }

            tracing::warn!(key = %key, token = %self.token, "token vanished from queue, rejoining");
        }
    }

    async fn release(&mut self) -> Result<(), LockError> {
        let Some(key) = self.queue_key.as_deref() else {
            tracing::debug!("release without acquire");
            return Ok(());
        };

        let token = self.token;
        let attempt = CasCell::new(&self.store, key)
            .update(|value| {
                let queue = TokenQueue::from_value(value);
                if queue.position(&token) == Some(0) {
                    let rest = TokenQueue::new(queue.without_head()).without(&token);
                    Ok(Update::Write(rest, ()))
                } else {
                    Ok(Update::Keep(()))
                }
            })
            .await?;

        match attempt {
            Attempt::Committed(()) => tracing::info!(key, token = %token, "released"),
            Attempt::Unchanged(()) => {
                tracing::debug!(key, token = %token, "not at queue head, already released")
            }
            Attempt::Missing | Attempt::Conflict => {
                tracing::warn!(key, "queue vanished before release")
            }
        }

        Ok(())
    }

    /// Remove our token wherever it sits in the queue
    async fn leave(&mut self) -> Result<(), LockError> {
        let Some(key) = self.queue_key.as_deref() else {
            return Ok(());
        };

        let token = self.token;
        let attempt = CasCell::new(&self.store, key)
            .update(|value| {
                let queue = TokenQueue::from_value(value);
                match queue.position(&token) {
                    Some(position) => Ok(Update::Write(queue.without(&token), Some(position))),
                    None => Ok(Update::Keep(None)),
                }
            })
            .await?;

        match attempt {
            Attempt::Committed(Some(position)) => {
                tracing::info!(key, token = %token, position, "left queue")
            }
            Attempt::Committed(None) | Attempt::Unchanged(_) => {
                tracing::debug!(key, token = %token, "not queued")
            }
            Attempt::Missing | Attempt::Conflict => {
                tracing::debug!(key, "queue vanished before leaving")
            }
        }

        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), LockError> {
        let key = fifo_key(session_id);
        match CasCell::new(&self.store, &key).delete().await? {
            DeleteOutcome::Deleted => tracing::info!(key = %key, "destroyed queue"),
            DeleteOutcome::NotFound => tracing::debug!(key = %key, "queue already absent"),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fifo_tests.rs"]
mod tests;
