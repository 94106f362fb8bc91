//! Virtual Connection I/O
//!
//! This crate provides the network side of the protocol: a non-blocking UDP
//! socket, a loss-simulating transport wrapper and an endpoint that routes
//! datagrams to per-peer virtual connections.

pub mod endpoint;
pub mod lossy;
pub mod socket;

pub use endpoint::{AcceptPolicy, Endpoint, EndpointError, EndpointStats, Received};
pub use lossy::LossyTransport;
pub use socket::{DatagramSocket, DatagramTransport, SocketError};
