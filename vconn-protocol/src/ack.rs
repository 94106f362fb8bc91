//! Ack header and bitfield encoding
//!
//! Every outgoing datagram carries its own sequence number, the highest
//! sequence number received from the peer (`ack`) and a bitfield telling the
//! peer which of the `ack_bits` sequence numbers ending at `ack` arrived.
//! Bit `i` stands for sequence number `ack - (ack_bits - 1) + i`, so the most
//! significant used bit is `ack` itself.

use crate::history::SequenceHistory;
use crate::sequence::SequenceSpace;
use std::fmt;

/// Header stamped on every datagram exchanged over a virtual connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AckHeader {
    /// Sequence number of this datagram
    pub sequence: u32,
    /// Highest sequence number the sender has received from us
    pub ack: u32,
    /// Which of the trailing window ending at `ack` the sender has received
    pub ack_bitfield: u32,
}

impl AckHeader {
    pub fn new(sequence: u32, ack: u32, ack_bitfield: u32) -> Self {
        AckHeader {
            sequence,
            ack,
            ack_bitfield,
        }
    }

    /// Sequence numbers this header reports as received
    pub fn acked_sequences(&self, space: SequenceSpace, ack_bits: u32) -> AckedSequences {
        acked_sequences(space, ack_bits, self.ack, self.ack_bitfield)
    }

    /// Whether this header reports `seq` as received
    pub fn acknowledges(&self, space: SequenceSpace, ack_bits: u32, seq: u32) -> bool {
        let base = window_base(space, ack_bits, self.ack);
        let offset = space.forward_distance(base, seq);
        offset < ack_bits && self.ack_bitfield & (1 << offset) != 0
    }
}

impl fmt::Display for AckHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seq={} ack={} bits={:#010x}",
            self.sequence, self.ack, self.ack_bitfield
        )
    }
}

/// Oldest sequence number covered by a window ending at `newest`
#[inline]
pub fn window_base(space: SequenceSpace, ack_bits: u32, newest: u32) -> u32 {
    space.wrap(-(ack_bits as i32 - 1), newest)
}

/// Build the ack bitfield for a window ending at `remote_sequence`
///
/// Window membership is decided in the sequence number space only: an entry
/// is covered when its forward distance from the window base is below
/// `ack_bits`. Entries outside the window are skipped.
pub fn encode_ack_bitfield(
    space: SequenceSpace,
    ack_bits: u32,
    remote_sequence: u32,
    history: &SequenceHistory,
) -> u32 {
    let base = window_base(space, ack_bits, remote_sequence);

    history.iter().fold(0u32, |bitfield, seq| {
        let offset = space.forward_distance(base, seq);
        if offset < ack_bits {
            bitfield | (1 << offset)
        } else {
            bitfield
        }
    })
}

/// Expand an `(ack, ack_bitfield)` pair into the acknowledged sequence numbers
///
/// Yields oldest first.
pub fn acked_sequences(
    space: SequenceSpace,
    ack_bits: u32,
    ack: u32,
    ack_bitfield: u32,
) -> AckedSequences {
    AckedSequences {
        space,
        base: window_base(space, ack_bits, ack),
        bitfield: ack_bitfield,
        offset: 0,
        width: ack_bits,
    }
}

/// Iterator returned by [`acked_sequences`]
#[derive(Debug, Clone)]
pub struct AckedSequences {
    space: SequenceSpace,
    base: u32,
    bitfield: u32,
    offset: u32,
    width: u32,
}

impl Iterator for AckedSequences {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while self.offset < self.width {
            let offset = self.offset;
            self.offset += 1;
            if self.bitfield & (1 << offset) != 0 {
                return Some(self.space.wrap(offset as i32, self.base));
            }
        }
        None
    }
}
