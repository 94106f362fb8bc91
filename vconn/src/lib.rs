//! vconn - Virtual Connections over UDP
//!
//! Ack bookkeeping for unreliable, unordered datagram transport: sequence
//! numbers, a bounded receive history and a 32-bit ack bitfield that lets a
//! peer infer loss without head-of-line blocking.

pub use vconn_io as io;
pub use vconn_protocol as protocol;

// Re-export commonly used types
pub use io::{DatagramSocket, DatagramTransport, Endpoint, LossyTransport};
pub use protocol::{AckHeader, ProtocolConfig, SequenceHistory, VirtualConnection};
