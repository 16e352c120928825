// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memcached-backed CAS store
//!
//! Holds one connection, opened on first use and reopened after any
//! transport failure. Requests are serialized over it; every round trip is
//! bounded by the configured timeout.

pub mod protocol;

use async_trait::async_trait;
use protocol::{read_reply, validate_key, Command, Item, Reply};
use slock_core::config::StoreSettings;
use slock_core::store::{
    AddOutcome, AppendOutcome, CasOutcome, CasStore, CasToken, DeleteOutcome, StoreError,
    Versioned,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

type Connection = BufStream<TcpStream>;

#[derive(Clone)]
pub struct MemcachedStore {
    addr: String,
    timeout: Duration,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl MemcachedStore {
    /// Create a store without connecting; the first request connects
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_settings(settings: &StoreSettings) -> Self {
        Self::new(settings.addr.clone(), settings.timeout)
    }

    /// Create a store and connect immediately, failing if the server is down
    pub async fn connect(addr: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let store = Self::new(addr, timeout);
        let conn = store.open().await?;
        *store.conn.lock().await = Some(conn);
        Ok(store)
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn open(&self) -> Result<Connection, StoreError> {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => {
                stream.set_nodelay(true)?;
                tracing::debug!(addr = %self.addr, "connected");
                Ok(BufStream::new(stream))
            }
            Ok(Err(e)) => Err(StoreError::Unreachable(format!("{}: {}", self.addr, e))),
            Err(_) => Err(StoreError::Unreachable(format!(
                "{}: connect timed out after {:?}",
                self.addr, self.timeout
            ))),
        }
    }

    /// Send one command and read its reply. The connection is dropped on
    /// any failure that may have left it mid-reply.
    async fn execute(&self, command: Command<'_>) -> Result<Reply, StoreError> {
        validate_key(command.key())?;
        let request = command.encode();

        let mut slot = self.conn.lock().await;
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => self.open().await?,
        };

        let round_trip = async {
            conn.write_all(&request).await?;
            conn.flush().await?;
            read_reply(&mut conn).await
        };

        let outcome = tokio::time::timeout(self.timeout, round_trip).await;
        match outcome {
            Ok(Ok(reply)) => {
                *slot = Some(conn);
                Ok(reply)
            }
            Ok(Err(StoreError::Server(msg))) => {
                *slot = Some(conn);
                Err(StoreError::Server(msg))
            }
            Ok(Err(e)) => {
                tracing::warn!(addr = %self.addr, error = %e, "dropping connection");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(addr = %self.addr, "request timed out, dropping connection");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

fn unexpected(op: &str, reply: Reply) -> StoreError {
    StoreError::Protocol(format!("unexpected reply to {op}: {reply:?}"))
}

/// The item for `key` from a retrieval reply
fn find_item(key: &str, reply: Reply, op: &str) -> Result<Option<Item>, StoreError> {
    match reply {
        Reply::Items(items) => Ok(items.into_iter().find(|item| item.key == key)),
        other => Err(unexpected(op, other)),
    }
}

#[async_trait]
impl CasStore for MemcachedStore {
    async fn add(&self, key: &str, value: &[u8]) -> Result<AddOutcome, StoreError> {
        match self.execute(Command::Add { key, value }).await? {
            Reply::Stored => Ok(AddOutcome::Created),
            Reply::NotStored => Ok(AddOutcome::AlreadyExists),
            other => Err(unexpected("add", other)),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let reply = self.execute(Command::Get { key }).await?;
        Ok(find_item(key, reply, "get")?.map(|item| item.data))
    }

    async fn gets(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        let reply = self.execute(Command::Gets { key }).await?;
        let Some(item) = find_item(key, reply, "gets")? else {
            return Ok(None);
        };
        let cas = item
            .cas
            .ok_or_else(|| StoreError::Protocol(format!("gets reply for {key:?} lacks cas")))?;
        Ok(Some(Versioned {
            value: item.data,
            cas: CasToken(cas),
        }))
    }

    async fn cas(
        &self,
        key: &str,
        cas: CasToken,
        value: &[u8],
    ) -> Result<CasOutcome, StoreError> {
        let command = Command::Cas {
            key,
            cas: cas.0,
            value,
        };
        match self.execute(command).await? {
            Reply::Stored => Ok(CasOutcome::Stored),
            Reply::Exists => Ok(CasOutcome::Conflict),
            Reply::NotFound => Ok(CasOutcome::NotFound),
            other => Err(unexpected("cas", other)),
        }
    }

    async fn append(&self, key: &str, suffix: &[u8]) -> Result<AppendOutcome, StoreError> {
        match self.execute(Command::Append { key, value: suffix }).await? {
            Reply::Stored => Ok(AppendOutcome::Appended),
            Reply::NotStored => Ok(AppendOutcome::NotFound),
            other => Err(unexpected("append", other)),
        }
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, StoreError> {
        match self.execute(Command::Delete { key }).await? {
            Reply::Deleted => Ok(DeleteOutcome::Deleted),
            Reply::NotFound => Ok(DeleteOutcome::NotFound),
            other => Err(unexpected("delete", other)),
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
