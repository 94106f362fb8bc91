//! Virtual Connection Protocol Core
//!
//! This crate implements the sequence bookkeeping for unreliable datagram
//! transport: circular sequence arithmetic, the bounded history of received
//! sequence numbers, ack bitfield encoding, the per-peer virtual connection
//! and the 12-byte wire header. It performs no I/O.

pub mod ack;
pub mod config;
pub mod connection;
pub mod history;
pub mod packet;
pub mod peers;
pub mod sequence;

pub use ack::{acked_sequences, encode_ack_bitfield, AckHeader, AckedSequences};
pub use config::{ConfigError, ProtocolConfig};
pub use connection::{consume_header, prepare_header, ConnectionStats, VirtualConnection};
pub use history::SequenceHistory;
pub use packet::{Datagram, PacketError, HEADER_SIZE, MAX_DATAGRAM_SIZE, MAX_PAYLOAD_SIZE};
pub use peers::{PeerError, PeerTable};
pub use sequence::SequenceSpace;
