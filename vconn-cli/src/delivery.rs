//! Delivery tracking from the peer's ack signal
//!
//! Remembers the sequence numbers we sent and settles each one once the
//! peer's headers either acknowledge it or move past it. A sequence number
//! that leaves the ack window without being acknowledged is counted as lost.
//! Nothing is resent; the demo only reports.

use std::collections::VecDeque;
use vconn_protocol::{AckHeader, SequenceSpace};

/// Counts of settled sequence numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub acked: u64,
    pub lost: u64,
    pub pending: u64,
}

/// Outstanding sequence numbers awaiting an ack verdict
#[derive(Debug, Clone)]
pub struct DeliveryTracker {
    space: SequenceSpace,
    ack_bits: u32,
    /// Sent sequence numbers, oldest first
    pending: VecDeque<u32>,
    acked: u64,
    lost: u64,
}

impl DeliveryTracker {
    pub fn new(space: SequenceSpace, ack_bits: u32) -> Self {
        DeliveryTracker {
            space,
            ack_bits,
            pending: VecDeque::new(),
            acked: 0,
            lost: 0,
        }
    }

    /// Record an outgoing sequence number
    pub fn on_sent(&mut self, sequence: u32) {
        self.pending.push_back(sequence);
    }

    /// Settle pending sequence numbers against a received header
    ///
    /// Returns the sequence numbers newly found lost.
    pub fn on_ack(&mut self, header: &AckHeader) -> Vec<u32> {
        let space = self.space;
        let ack_bits = self.ack_bits;
        let mut lost = Vec::new();
        let mut acked = 0;

        self.pending.retain(|&seq| {
            if header.acknowledges(space, ack_bits, seq) {
                acked += 1;
                return false;
            }
            // Older than the window's base and never acknowledged
            let behind = space.is_more_recent(header.ack, seq)
                && space.forward_distance(seq, header.ack) >= ack_bits;
            if behind {
                lost.push(seq);
            }
            !behind
        });

        self.acked += acked;
        self.lost += lost.len() as u64;
        lost
    }

    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            acked: self.acked,
            lost: self.lost,
            pending: self.pending.len() as u64,
        }
    }
}
