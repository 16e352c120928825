// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Locks against a real memcached server.
//!
//! Skipped unless `SLOCK_MEMCACHED_ADDR` names a server, e.g.
//! `SLOCK_MEMCACHED_ADDR=127.0.0.1:11211 cargo test -p slock-adapters`.

use slock_adapters::{MemcachedStore, TracedStore};
use slock_core::{
    CasStore, FifoConfig, FifoQueueLock, SemaphoreConfig, SemaphoreLock, SessionLock,
};
use std::time::Duration;

fn live_store() -> Option<MemcachedStore> {
    let addr = std::env::var("SLOCK_MEMCACHED_ADDR").ok()?;
    Some(MemcachedStore::new(addr, Duration::from_secs(2)))
}

/// Session ids unique per run so reruns never see stale state
fn session(name: &str) -> String {
    format!("{name}-{}-{}", std::process::id(), rand_suffix())
}

fn rand_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

#[tokio::test]
async fn store_contract_against_memcached() {
    let Some(store) = live_store() else {
        eprintln!("SLOCK_MEMCACHED_ADDR not set, skipping");
        return;
    };
    let key = session("contract");

    assert_eq!(
        store.add(&key, b"a").await.unwrap(),
        slock_core::AddOutcome::Created
    );
    assert_eq!(
        store.add(&key, b"b").await.unwrap(),
        slock_core::AddOutcome::AlreadyExists
    );
    store.append(&key, b"c").await.unwrap();

    let current = store.gets(&key).await.unwrap().unwrap();
    assert_eq!(current.value, b"ac".to_vec());
    assert_eq!(
        store.cas(&key, current.cas, b"d").await.unwrap(),
        slock_core::CasOutcome::Stored
    );
    assert_eq!(
        store.cas(&key, current.cas, b"e").await.unwrap(),
        slock_core::CasOutcome::Conflict
    );

    store.delete(&key).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn fifo_lock_against_memcached() {
    let Some(store) = live_store() else {
        eprintln!("SLOCK_MEMCACHED_ADDR not set, skipping");
        return;
    };
    let id = session("fifo");
    let config = FifoConfig::new().with_poll_interval(Duration::from_millis(5));
    let mut a = FifoQueueLock::with_config(TracedStore::new(store.clone()), config.clone());
    let mut b = FifoQueueLock::with_config(TracedStore::new(store.clone()), config);

    a.acquire(&id).await.unwrap();
    let waiter_id = id.clone();
    let handle = tokio::spawn(async move {
        b.acquire(&waiter_id).await.unwrap();
        b
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    a.release().await.unwrap();
    let mut b = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    b.release().await.unwrap();
    b.destroy(&id).await.unwrap();
}

#[tokio::test]
async fn semaphore_lock_against_memcached() {
    let Some(store) = live_store() else {
        eprintln!("SLOCK_MEMCACHED_ADDR not set, skipping");
        return;
    };
    let id = session("semaphore");
    let mut lock = SemaphoreLock::with_config(store.clone(), SemaphoreConfig::new(1));

    lock.acquire(&id).await.unwrap();
    assert_eq!(
        store.get(&slock_core::semaphore_key(&id)).await.unwrap(),
        Some(b"0".to_vec())
    );
    lock.release().await.unwrap();
    assert_eq!(
        store.get(&slock_core::semaphore_key(&id)).await.unwrap(),
        Some(b"1".to_vec())
    );
    lock.destroy(&id).await.unwrap();
}
