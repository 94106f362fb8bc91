//! Virtual Connection
//!
//! Per-peer sequence state over a connectionless transport. A connection
//! stamps outgoing datagrams with [`prepare_header`](VirtualConnection::prepare_header)
//! and learns about the peer through [`consume_header`](VirtualConnection::consume_header).
//! It performs no I/O itself; the owning endpoint holds the transport.
//!
//! There is no handshake or teardown: a connection is active for as long as
//! its owner keeps it.

use crate::ack::{encode_ack_bitfield, AckHeader};
use crate::config::ProtocolConfig;
use crate::history::SequenceHistory;
use std::net::SocketAddr;
use tracing::trace;

/// Connection statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Headers produced for outgoing datagrams
    pub headers_sent: u64,
    /// Headers consumed from incoming datagrams
    pub headers_received: u64,
    /// Incoming headers that did not advance the remote sequence
    pub stale_headers: u64,
}

/// Sequence bookkeeping for one peer
#[derive(Debug, Clone)]
pub struct VirtualConnection {
    /// Peer address
    remote_addr: SocketAddr,
    /// Next outgoing sequence number
    local_sequence: u32,
    /// Highest sequence number received from the peer
    remote_sequence: u32,
    /// Recently received sequence numbers
    history: SequenceHistory,
    /// Protocol parameters
    config: ProtocolConfig,
    /// Connection statistics
    stats: ConnectionStats,
}

impl VirtualConnection {
    /// Create a connection to `remote_addr`
    pub fn new(remote_addr: SocketAddr, config: ProtocolConfig) -> Self {
        VirtualConnection {
            remote_addr,
            local_sequence: config.initial_sequence(),
            remote_sequence: 0,
            history: SequenceHistory::new(config.history_capacity()),
            config,
            stats: ConnectionStats::default(),
        }
    }

    /// Build the header for the next outgoing datagram
    ///
    /// Consumes one local sequence number, so call it exactly once per
    /// datagram sent.
    pub fn prepare_header(&mut self) -> AckHeader {
        let space = self.config.space();
        let header = AckHeader {
            sequence: self.local_sequence,
            ack: self.remote_sequence,
            ack_bitfield: encode_ack_bitfield(
                space,
                self.config.ack_bits(),
                self.remote_sequence,
                &self.history,
            ),
        };

        self.local_sequence = space.next(self.local_sequence);
        self.stats.headers_sent += 1;

        trace!(peer = %self.remote_addr, %header, "prepared header");
        header
    }

    /// Record the header of a datagram received from the peer
    ///
    /// The remote sequence only moves forward (in circular order), while
    /// every received sequence number goes into the history, stale or not.
    pub fn consume_header(&mut self, header: AckHeader) {
        let space = self.config.space();
        let sequence = header.sequence % space.modulus();

        if space.is_more_recent(sequence, self.remote_sequence) {
            self.remote_sequence = sequence;
        } else {
            self.stats.stale_headers += 1;
        }
        self.history.push(sequence);
        self.stats.headers_received += 1;

        trace!(
            peer = %self.remote_addr,
            %header,
            remote_sequence = self.remote_sequence,
            "consumed header"
        );
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn local_sequence(&self) -> u32 {
        self.local_sequence
    }

    pub fn remote_sequence(&self) -> u32 {
        self.remote_sequence
    }

    pub fn history(&self) -> &SequenceHistory {
        &self.history
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    /// Whether the last header received from the peer acknowledges `seq`
    pub fn peer_acknowledges(&self, header: &AckHeader, seq: u32) -> bool {
        header.acknowledges(self.config.space(), self.config.ack_bits(), seq)
    }
}

/// Prepare a header on an optional connection
///
/// An absent connection yields the all-zero header and no state changes.
pub fn prepare_header(connection: Option<&mut VirtualConnection>) -> AckHeader {
    connection
        .map(VirtualConnection::prepare_header)
        .unwrap_or_default()
}

/// Consume a header on an optional connection; does nothing when absent
pub fn consume_header(connection: Option<&mut VirtualConnection>, header: AckHeader) {
    if let Some(connection) = connection {
        connection.consume_header(header);
    }
}
