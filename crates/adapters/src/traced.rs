// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use async_trait::async_trait;
use slock_core::store::{
    AddOutcome, AppendOutcome, CasOutcome, CasStore, CasToken, DeleteOutcome, StoreError,
    Versioned,
};
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds a span and timing to every call on any CasStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

/// Keys are never empty; catch it before it reaches the wire
fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        tracing::error!("empty key");
        return Err(StoreError::InvalidKey(String::new()));
    }
    Ok(())
}

fn log_result<T: std::fmt::Debug>(result: &Result<T, StoreError>, started: Instant) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(outcome) => tracing::debug!(elapsed_ms, ?outcome, "done"),
        Err(e) => tracing::error!(elapsed_ms, error = %e, "failed"),
    }
}

#[async_trait]
impl<S: CasStore> CasStore for TracedStore<S> {
    async fn add(&self, key: &str, value: &[u8]) -> Result<AddOutcome, StoreError> {
        let span = tracing::info_span!("store.add", key, len = value.len());
        async {
            check_key(key)?;
            let started = Instant::now();
            let result = self.inner.add(key, value).await;
            log_result(&result, started);
            result
        }
        .instrument(span)
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let span = tracing::debug_span!("store.get", key);
        async {
            check_key(key)?;
            let started = Instant::now();
            let result = self.inner.get(key).await;
            match &result {
                Ok(value) => tracing::trace!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    len = value.as_ref().map(Vec::len),
                    "fetched"
                ),
                Err(e) => tracing::error!(error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn gets(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        let span = tracing::debug_span!("store.gets", key);
        async {
            check_key(key)?;
            let started = Instant::now();
            let result = self.inner.gets(key).await;
            match &result {
                Ok(value) => tracing::trace!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    cas = value.as_ref().map(|v| v.cas.0),
                    "fetched"
                ),
                Err(e) => tracing::error!(error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn cas(
        &self,
        key: &str,
        cas: CasToken,
        value: &[u8],
    ) -> Result<CasOutcome, StoreError> {
        let span = tracing::info_span!("store.cas", key, cas = cas.0, len = value.len());
        async {
            check_key(key)?;
            let started = Instant::now();
            let result = self.inner.cas(key, cas, value).await;
            log_result(&result, started);
            result
        }
        .instrument(span)
        .await
    }

    async fn append(&self, key: &str, value: &[u8]) -> Result<AppendOutcome, StoreError> {
        let span = tracing::info_span!("store.append", key, len = value.len());
        async {
            check_key(key)?;
            let started = Instant::now();
            let result = self.inner.append(key, value).await;
            log_result(&result, started);
            result
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, StoreError> {
        let span = tracing::info_span!("store.delete", key);
        async {
            check_key(key)?;
            let started = Instant::now();
            let result = self.inner.delete(key).await;
            // Deleting an absent key is routine
            match &result {
                Ok(outcome) => tracing::info!(?outcome, "deleted"),
                Err(e) => tracing::warn!(error = %e, "delete failed"),
            }
            tracing::trace!(elapsed_ms = started.elapsed().as_millis() as u64);
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
