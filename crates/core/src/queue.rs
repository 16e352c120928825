// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-packed waiter queue
//!
//! A FIFO queue is stored as one flat value: the concatenation of its
//! tokens, head first. Appending a token is the store's atomic append, and
//! popping the head is a conditional write of everything after the first
//! slot. A missing value is an empty queue.

use crate::token::{Token, TOKEN_SIZE};

/// Read-only view over a stored queue value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenQueue<'a> {
    bytes: &'a [u8],
}

impl<'a> TokenQueue<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// View over an optional value, where absence means empty
    pub fn from_value(value: Option<&'a [u8]>) -> Self {
        Self::new(value.unwrap_or_default())
    }

    /// Number of whole tokens
    pub fn len(&self) -> usize {
        self.bytes.len() / TOKEN_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// False if the value carries a trailing partial token
    pub fn is_aligned(&self) -> bool {
        self.bytes.len() % TOKEN_SIZE == 0
    }

    /// Tokens in queue order. A trailing partial chunk is ignored.
    pub fn tokens(&self) -> impl Iterator<Item = Token> + 'a {
        self.bytes.chunks_exact(TOKEN_SIZE).filter_map(Token::from_slice)
    }

    /// Index of the first slot holding `token`
    pub fn position(&self, token: &Token) -> Option<usize> {
        self.bytes
            .chunks_exact(TOKEN_SIZE)
            .position(|chunk| chunk == token.as_bytes())
    }

    pub fn head(&self) -> Option<Token> {
        self.tokens().next()
    }

    /// The stored value with the head slot removed
    pub fn without_head(&self) -> &'a [u8] {
        self.bytes.get(TOKEN_SIZE..).unwrap_or_default()
    }

    /// The stored value with every slot holding `token` removed
    pub fn without(&self, token: &Token) -> Vec<u8> {
        let chunks = self.bytes.chunks_exact(TOKEN_SIZE);
        let partial = chunks.remainder();
        let mut kept: Vec<u8> = chunks
            .filter(|chunk| *chunk != token.as_bytes())
            .flatten()
            .copied()
            .collect();
        kept.extend_from_slice(partial);
        kept
    }
}

/// Encode tokens as a queue value
pub fn encode<'t>(tokens: impl IntoIterator<Item = &'t Token>) -> Vec<u8> {
    tokens
        .into_iter()
        .flat_map(|t| t.as_bytes().iter().copied())
        .collect()
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
