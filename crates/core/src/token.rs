// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Waiter tokens for the FIFO queue

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Size in bytes of one queue slot. Shared with every client of the queue.
pub const TOKEN_SIZE: usize = 15;

/// Identity of one waiter in a FIFO queue
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token([u8; TOKEN_SIZE]);

impl Token {
    pub const fn from_bytes(bytes: [u8; TOKEN_SIZE]) -> Self {
        Self(bytes)
    }

    /// Read a token from exactly `TOKEN_SIZE` bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; TOKEN_SIZE]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Generates waiter tokens
pub trait TokenGen: Clone + Send + Sync {
    fn next(&self) -> Token;
}

/// Random tokens for production use
#[derive(Clone, Default)]
pub struct RandomTokenGen;

impl TokenGen for RandomTokenGen {
    fn next(&self) -> Token {
        let uuid = uuid::Uuid::new_v4();
        let mut bytes = [0u8; TOKEN_SIZE];
        bytes.copy_from_slice(&uuid.as_bytes()[..TOKEN_SIZE]);
        Token(bytes)
    }
}

/// Predictable tokens for testing: a short prefix followed by a counter
#[derive(Clone)]
pub struct SequentialTokenGen {
    prefix: u8,
    counter: Arc<AtomicU64>,
}

impl SequentialTokenGen {
    pub fn new(prefix: u8) -> Self {
        Self {
            prefix,
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialTokenGen {
    fn default() -> Self {
        Self::new(b't')
    }
}

impl TokenGen for SequentialTokenGen {
    fn next(&self) -> Token {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut bytes = [self.prefix; TOKEN_SIZE];
        bytes[TOKEN_SIZE - 8..].copy_from_slice(&n.to_be_bytes());
        Token(bytes)
    }
}
