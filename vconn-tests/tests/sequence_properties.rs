//! Property-based tests for sequence arithmetic, the history ring and the
//! ack bitfield encoder
//!
//! These tests use proptest to check the arithmetic laws over the whole
//! sequence space and compare the encoder against a direct window scan.

use proptest::prelude::*;
use vconn_protocol::ack::{acked_sequences, encode_ack_bitfield, window_base};
use vconn_protocol::sequence::{
    circular_distance, forward_distance, is_more_recent, wrap, DEFAULT_SEQUENCE_MODULUS,
};
use vconn_protocol::{AckHeader, ProtocolConfig, SequenceHistory, SequenceSpace, VirtualConnection};

const M: u32 = DEFAULT_SEQUENCE_MODULUS;

fn seq_strategy() -> impl Strategy<Value = u32> {
    0..M
}

fn modulus_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![Just(2u32), Just(64), Just(256), Just(4096), Just(65536), 2u32..100_000]
}

/// Bit `i` set iff `base + i` is anywhere in the history
fn scan_window(space: SequenceSpace, bits: u32, remote: u32, history: &SequenceHistory) -> u32 {
    let base = window_base(space, bits, remote);
    (0..bits).fold(0, |mask, i| {
        if history.contains(space.wrap(i as i32, base)) {
            mask | (1 << i)
        } else {
            mask
        }
    })
}

proptest! {
    #[test]
    fn prop_wrap_inverse(v in seq_strategy()) {
        prop_assert_eq!(wrap(1, wrap(-1, v, M), M), v);
        prop_assert_eq!(wrap(-1, wrap(1, v, M), M), v);
    }

    #[test]
    fn prop_wrap_stays_in_range(
        modulus in modulus_strategy(),
        value in any::<u32>(),
        delta in -1000i32..=1000,
    ) {
        prop_assert!(wrap(delta, value, modulus) < modulus);
    }

    #[test]
    fn prop_distance_laws(a in seq_strategy(), b in seq_strategy()) {
        prop_assert_eq!(circular_distance(a, b, M), circular_distance(b, a, M));
        prop_assert_eq!(circular_distance(a, a, M), 0);
        prop_assert!(circular_distance(a, b, M) <= M / 2);
        prop_assert_eq!(circular_distance(a, b, M) == 0, a == b);
    }

    #[test]
    fn prop_distance_matches_forward_arcs(a in seq_strategy(), b in seq_strategy()) {
        let forward = forward_distance(a, b, M);
        let backward = forward_distance(b, a, M);
        prop_assert_eq!(circular_distance(a, b, M), forward.min(backward));
    }

    #[test]
    fn prop_more_recent_antisymmetric(a in seq_strategy(), b in seq_strategy()) {
        let ab = is_more_recent(a, b, M);
        let ba = is_more_recent(b, a, M);

        if a == b {
            prop_assert!(!ab && !ba);
        } else if circular_distance(a, b, M) == M / 2 {
            // Tie: the numerically larger value wins
            prop_assert_eq!(ab, a > b);
            prop_assert_eq!(ba, b > a);
        } else {
            prop_assert!(ab != ba);
        }
    }

    #[test]
    fn prop_successor_is_more_recent(a in seq_strategy(), step in 1u32..M / 2) {
        let b = wrap(step as i32, a, M);
        prop_assert!(is_more_recent(b, a, M));
        prop_assert!(!is_more_recent(a, b, M));
    }

    #[test]
    fn prop_history_keeps_newest(
        capacity in 1usize..64,
        values in prop::collection::vec(seq_strategy(), 0..200),
    ) {
        let mut history = SequenceHistory::new(capacity);
        for &v in &values {
            history.push(v);
        }

        let expected: Vec<u32> = values.iter().rev().take(capacity).copied().collect();
        prop_assert_eq!(history.values().collect::<Vec<_>>(), expected);
        prop_assert_eq!(history.len(), values.len().min(capacity));
    }

    #[test]
    fn prop_bitfield_matches_window_scan(
        remote in seq_strategy(),
        bits in 1u32..=32,
        offsets in prop::collection::vec(-100i32..100, 0..80),
    ) {
        let space = SequenceSpace::default();
        let mut history = SequenceHistory::new(256);
        for offset in offsets {
            history.push(space.wrap(offset, remote));
        }

        let encoded = encode_ack_bitfield(space, bits, remote, &history);
        prop_assert_eq!(encoded, scan_window(space, bits, remote, &history));
        if bits < 32 {
            prop_assert_eq!(encoded >> bits, 0);
        }
    }

    #[test]
    fn prop_acked_sequences_roundtrip(
        remote in seq_strategy(),
        bitfield in any::<u32>(),
    ) {
        let space = SequenceSpace::default();
        let header = AckHeader::new(0, remote, bitfield);

        let acked: Vec<u32> = acked_sequences(space, 32, remote, bitfield).collect();
        prop_assert_eq!(acked.len() as u32, bitfield.count_ones());
        for seq in acked {
            prop_assert!(header.acknowledges(space, 32, seq));
        }
    }

    #[test]
    fn prop_remote_sequence_never_regresses(
        start in seq_strategy(),
        steps in prop::collection::vec(-40i32..40, 1..100),
    ) {
        // Headers drift forward with local reordering; the high-water mark
        // must never move backwards.
        let config = ProtocolConfig::default();
        let space = config.space();
        let mut conn = VirtualConnection::new("127.0.0.1:9000".parse().unwrap(), config);

        let mut cursor = start;
        for step in steps {
            cursor = space.wrap(step.abs(), cursor);
            let seq = space.wrap(step.min(0), cursor);
            let before = conn.remote_sequence();
            conn.consume_header(AckHeader::new(seq, 0, 0));
            let after = conn.remote_sequence();

            prop_assert!(after == before || space.is_more_recent(after, before));
            prop_assert_eq!(conn.history().newest(), Some(seq));
        }
    }
}
