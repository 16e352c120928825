// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store
//!
//! Shares state between clones, so independent lock instances in one process
//! coordinate through it exactly as they would through memcached. Tests use
//! the recorded calls, injected failures and scheduled interference to
//! reproduce external writers, evictions and outages deterministically.

use super::{
    AddOutcome, AppendOutcome, CasOutcome, CasStore, CasToken, DeleteOutcome, StoreError,
    StoreOp, Versioned,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Add { key: String, value: Vec<u8> },
    Get { key: String },
    Gets { key: String },
    Cas { key: String, cas: CasToken, value: Vec<u8> },
    Append { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::Add { .. } => StoreOp::Add,
            StoreCall::Get { .. } => StoreOp::Get,
            StoreCall::Gets { .. } => StoreOp::Gets,
            StoreCall::Cas { .. } => StoreOp::Cas,
            StoreCall::Append { .. } => StoreOp::Append,
            StoreCall::Delete { .. } => StoreOp::Delete,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            StoreCall::Add { key, .. }
            | StoreCall::Get { key }
            | StoreCall::Gets { key }
            | StoreCall::Cas { key, .. }
            | StoreCall::Append { key, .. }
            | StoreCall::Delete { key } => key,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    version: u64,
}

/// The stored values. Every mutation assigns a fresh version.
#[derive(Debug, Default)]
pub struct Entries {
    map: HashMap<String, Entry>,
    last_version: u64,
}

impl Entries {
    fn next_version(&mut self) -> u64 {
        self.last_version += 1;
        self.last_version
    }

    pub fn value(&self, key: &str) -> Option<&[u8]> {
        self.map.get(key).map(|e| e.value.as_slice())
    }

    /// Overwrite (or create) a value
    pub fn set(&mut self, key: &str, value: &[u8]) {
        let version = self.next_version();
        self.map.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                version,
            },
        );
    }

    /// Append to an existing value, returning false if it is absent
    pub fn append(&mut self, key: &str, suffix: &[u8]) -> bool {
        let version = self.next_version();
        match self.map.get_mut(key) {
            Some(entry) => {
                entry.value.extend_from_slice(suffix);
                entry.version = version;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

type Interference = Box<dyn FnOnce(&mut Entries) + Send>;

#[derive(Default)]
struct State {
    entries: Entries,
    recording: bool,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, String>,
    interference: Vec<(StoreOp, Interference)>,
}

/// In-memory [`CasStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that keeps a log of every call, for asserting on access patterns
    pub fn recording() -> Self {
        let store = Self::default();
        store.state().recording = true;
        store
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call, apply injected failures and pending interference
    fn begin(&self, call: StoreCall) -> Result<MutexGuard<'_, State>, StoreError> {
        let op = call.op();
        let mut state = self.state();
        if state.recording {
            state.calls.push(call);
        }

        if let Some(message) = state.failures.get(&op) {
            return Err(StoreError::Unreachable(message.clone()));
        }

        if let Some(index) = state.interference.iter().position(|(o, _)| *o == op) {
            let (_, interfere) = state.interference.remove(index);
            interfere(&mut state.entries);
        }

        Ok(state)
    }

    /// All calls made so far. Always empty unless built with [`MemoryStore::recording`].
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Calls of one kind made so far
    pub fn calls_of(&self, op: StoreOp) -> Vec<StoreCall> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Current value of a key, bypassing call recording
    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.state().entries.value(key).map(<[u8]>::to_vec)
    }

    /// Overwrite a key as an external writer would
    pub fn set(&self, key: &str, value: &[u8]) {
        self.state().entries.set(key, value);
    }

    /// Drop a key as an eviction would
    pub fn evict(&self, key: &str) {
        self.state().entries.remove(key);
    }

    /// Drop every key as a restart or flush would
    pub fn flush(&self) {
        self.state().entries.clear();
    }

    /// Make every call of `op` fail until [`MemoryStore::heal`]
    pub fn fail(&self, op: StoreOp, message: impl Into<String>) {
        self.state().failures.insert(op, message.into());
    }

    pub fn heal(&self, op: StoreOp) {
        self.state().failures.remove(&op);
    }

    /// Run `f` against the entries right before the next `op` call is applied,
    /// simulating a concurrent writer winning the race
    pub fn interfere(&self, op: StoreOp, f: impl FnOnce(&mut Entries) + Send + 'static) {
        self.state().interference.push((op, Box::new(f)));
    }
}

#[async_trait]
impl CasStore for MemoryStore {
    async fn add(&self, key: &str, value: &[u8]) -> Result<AddOutcome, StoreError> {
        let mut state = self.begin(StoreCall::Add {
            key: key.to_string(),
            value: value.to_vec(),
        })?;

        if state.entries.value(key).is_some() {
            return Ok(AddOutcome::AlreadyExists);
        }
        state.entries.set(key, value);
        Ok(AddOutcome::Created)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let state = self.begin(StoreCall::Get {
            key: key.to_string(),
        })?;
        Ok(state.entries.value(key).map(<[u8]>::to_vec))
    }

    async fn gets(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        let state = self.begin(StoreCall::Gets {
            key: key.to_string(),
        })?;
        Ok(state.entries.map.get(key).map(|e| Versioned {
            value: e.value.clone(),
            cas: CasToken(e.version),
        }))
    }

    async fn cas(
        &self,
        key: &str,
        cas: CasToken,
        value: &[u8],
    ) -> Result<CasOutcome, StoreError> {
        let mut state = self.begin(StoreCall::Cas {
            key: key.to_string(),
            cas,
            value: value.to_vec(),
        })?;

        match state.entries.map.get(key) {
            None => Ok(CasOutcome::NotFound),
            Some(entry) if entry.version != cas.0 => Ok(CasOutcome::Conflict),
            Some(_) => {
                state.entries.set(key, value);
                Ok(CasOutcome::Stored)
            }
        }
    }

    async fn append(&self, key: &str, suffix: &[u8]) -> Result<AppendOutcome, StoreError> {
        let mut state = self.begin(StoreCall::Append {
            key: key.to_string(),
            value: suffix.to_vec(),
        })?;

        if state.entries.append(key, suffix) {
            Ok(AppendOutcome::Appended)
        } else {
            Ok(AppendOutcome::NotFound)
        }
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, StoreError> {
        let mut state = self.begin(StoreCall::Delete {
            key: key.to_string(),
        })?;

        if state.entries.remove(key) {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
