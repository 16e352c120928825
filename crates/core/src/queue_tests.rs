// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::token::{SequentialTokenGen, TokenGen};
use proptest::prelude::*;

fn tokens(n: usize) -> Vec<Token> {
    let token_gen = SequentialTokenGen::default();
    (0..n).map(|_| token_gen.next()).collect()
}

#[test]
fn missing_value_is_empty_queue() {
    let queue = TokenQueue::from_value(None);
    assert!(queue.is_empty());
    assert_eq!(queue.head(), None);
    assert_eq!(queue.without_head(), b"");
}

#[test]
fn position_follows_arrival_order() {
    let t = tokens(3);
    let value = encode(&t);
    let queue = TokenQueue::new(&value);

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.position(&t[0]), Some(0));
    assert_eq!(queue.position(&t[1]), Some(1));
    assert_eq!(queue.position(&t[2]), Some(2));
    assert_eq!(queue.head(), Some(t[0]));
}

#[test]
fn position_of_absent_token_is_none() {
    let t = tokens(3);
    let value = encode(&t[..2]);
    assert_eq!(TokenQueue::new(&value).position(&t[2]), None);
}

#[test]
fn without_head_drops_exactly_one_slot() {
    let t = tokens(3);
    let value = encode(&t);
    let rest = TokenQueue::new(&value).without_head();
    assert_eq!(rest, encode(&t[1..]).as_slice());
}

#[test]
fn without_drops_every_copy_of_a_token() {
    let t = tokens(3);
    let value = encode(&[t[0], t[1], t[0], t[2]]);
    let rest = TokenQueue::new(&value).without(&t[0]);
    assert_eq!(rest, encode(&[t[1], t[2]]));
    assert_eq!(TokenQueue::new(&value).without(&tokens(4)[3]), value);
}

#[test]
fn position_is_slot_aligned() {
    // The token's bytes straddle two slots but never occupy one whole slot
    let t = tokens(1);
    let mut value = vec![0u8; 5];
    value.extend_from_slice(t[0].as_bytes());
    value.extend_from_slice(&[0u8; TOKEN_SIZE - 5]);

    assert_eq!(TokenQueue::new(&value).position(&t[0]), None);
}

use yare::parameterized;

#[parameterized(
    empty = { 0, 0, true },
    one_token = { TOKEN_SIZE, 1, true },
    partial_only = { TOKEN_SIZE - 1, 0, false },
    two_tokens_and_partial = { 2 * TOKEN_SIZE + 3, 2, false },
)]
fn queue_length_counts_whole_tokens(bytes: usize, expected_len: usize, aligned: bool) {
    let value = vec![7u8; bytes];
    let queue = TokenQueue::new(&value);
    assert_eq!(queue.len(), expected_len);
    assert_eq!(queue.is_aligned(), aligned);
    assert_eq!(queue.tokens().count(), expected_len);
}

proptest! {
    #[test]
    fn every_token_found_at_its_index(n in 1usize..20) {
        let t = tokens(n);
        let value = encode(&t);
        let queue = TokenQueue::new(&value);

        for (i, token) in t.iter().enumerate() {
            prop_assert_eq!(queue.position(token), Some(i));
        }
    }

    #[test]
    fn popping_head_shifts_positions_by_one(n in 2usize..20) {
        let t = tokens(n);
        let value = encode(&t);
        let rest = TokenQueue::new(&value).without_head();
        let popped = TokenQueue::new(rest);

        prop_assert_eq!(popped.len(), n - 1);
        prop_assert_eq!(popped.position(&t[0]), None);
        for (i, token) in t.iter().enumerate().skip(1) {
            prop_assert_eq!(popped.position(token), Some(i - 1));
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..100)) {
        let queue = TokenQueue::new(&bytes);
        let t = tokens(1);
        let _ = queue.position(&t[0]);
        prop_assert!(queue.without_head().len() <= bytes.len());
        prop_assert_eq!(queue.tokens().count(), bytes.len() / TOKEN_SIZE);
    }
}
