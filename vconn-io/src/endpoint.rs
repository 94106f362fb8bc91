//! Datagram endpoint
//!
//! Ties a transport to a table of virtual connections. Outgoing payloads are
//! stamped with the peer's next header; incoming datagrams are routed to the
//! sender's connection, which consumes their header.
//!
//! A server accepts any peer and creates connections on first receipt. A
//! client only talks to the peers it connected to and discards datagrams
//! from anyone else before their headers reach a connection.

use crate::socket::{DatagramTransport, SocketError};
use bytes::Bytes;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::{debug, trace, warn};
use vconn_protocol::peers::DEFAULT_MAX_PEERS;
use vconn_protocol::{
    AckHeader, Datagram, PacketError, PeerError, PeerTable, ProtocolConfig, VirtualConnection,
};

/// Endpoint errors
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Socket error: {0}")]
    Socket(#[from] SocketError),

    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Peer error: {0}")]
    Peer(#[from] PeerError),

    #[error("No virtual connection to {0}")]
    UnknownPeer(SocketAddr),
}

/// Which senders an endpoint accepts datagrams from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptPolicy {
    /// Create a connection for every new sender
    AnyPeer,
    /// Only accept senders with an existing connection
    KnownPeers,
}

/// A datagram accepted by [`Endpoint::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub peer: SocketAddr,
    pub header: AckHeader,
    pub payload: Bytes,
}

/// Endpoint statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointStats {
    pub datagrams_sent: u64,
    pub datagrams_received: u64,
    /// Datagrams dropped for being malformed or from an unaccepted sender
    pub datagrams_discarded: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Transport plus per-peer virtual connections
pub struct Endpoint<T> {
    transport: T,
    peers: PeerTable,
    policy: AcceptPolicy,
    stats: EndpointStats,
}

impl<T: DatagramTransport> Endpoint<T> {
    pub fn new(transport: T, config: ProtocolConfig, policy: AcceptPolicy, max_peers: usize) -> Self {
        Endpoint {
            transport,
            peers: PeerTable::new(max_peers, config),
            policy,
            stats: EndpointStats::default(),
        }
    }

    /// Endpoint accepting any peer
    pub fn server(transport: T, config: ProtocolConfig) -> Self {
        Self::new(transport, config, AcceptPolicy::AnyPeer, DEFAULT_MAX_PEERS)
    }

    /// Endpoint talking to a single known peer
    pub fn client(
        transport: T,
        server: SocketAddr,
        config: ProtocolConfig,
    ) -> Result<Self, EndpointError> {
        let mut endpoint = Self::new(transport, config, AcceptPolicy::KnownPeers, 1);
        endpoint.peers.get_or_insert(server)?;
        Ok(endpoint)
    }

    /// Create (or fetch) the connection to `addr`
    pub fn connect(&mut self, addr: SocketAddr) -> Result<&mut VirtualConnection, EndpointError> {
        Ok(self.peers.get_or_insert(addr)?)
    }

    /// Send `payload` to `peer`, stamped with the connection's next header
    ///
    /// Returns the header that went out.
    pub fn send(&mut self, peer: SocketAddr, payload: &[u8]) -> Result<AckHeader, EndpointError> {
        let conn = self
            .peers
            .get_mut(&peer)
            .ok_or(EndpointError::UnknownPeer(peer))?;

        let header = conn.prepare_header();
        let datagram = Datagram::new(header, Bytes::copy_from_slice(payload));
        let bytes = datagram.to_bytes()?;

        let sent = self.transport.send_to(&bytes, peer)?;
        if sent < bytes.len() {
            warn!(%peer, sent, expected = bytes.len(), "short send");
        }

        self.stats.datagrams_sent += 1;
        self.stats.bytes_sent += sent as u64;
        trace!(%peer, %header, "sent datagram");

        Ok(header)
    }

    /// Receive the next accepted datagram, if any
    ///
    /// Never blocks. Malformed datagrams and datagrams from senders the
    /// policy rejects are discarded and skipped.
    pub fn poll(&mut self, buf: &mut [u8]) -> Result<Option<Received>, EndpointError> {
        loop {
            let Some((n, from)) = self.transport.recv_from(buf)? else {
                return Ok(None);
            };

            let datagram = match Datagram::from_bytes(&buf[..n]) {
                Ok(datagram) => datagram,
                Err(e) => {
                    warn!(peer = %from, error = %e, "discarding malformed datagram");
                    self.stats.datagrams_discarded += 1;
                    continue;
                }
            };

            let conn = match self.policy {
                AcceptPolicy::AnyPeer => match self.peers.get_or_insert(from) {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "discarding datagram");
                        self.stats.datagrams_discarded += 1;
                        continue;
                    }
                },
                AcceptPolicy::KnownPeers => match self.peers.get_mut(&from) {
                    Some(conn) => conn,
                    None => {
                        debug!(peer = %from, "discarding datagram from unknown peer");
                        self.stats.datagrams_discarded += 1;
                        continue;
                    }
                },
            };

            conn.consume_header(datagram.header);
            self.stats.datagrams_received += 1;
            self.stats.bytes_received += n as u64;

            return Ok(Some(Received {
                peer: from,
                header: datagram.header,
                payload: datagram.payload,
            }));
        }
    }

    pub fn peer(&self, addr: &SocketAddr) -> Option<&VirtualConnection> {
        self.peers.get(addr)
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    /// Forget the connection to `addr`
    pub fn disconnect(&mut self, addr: &SocketAddr) -> Option<VirtualConnection> {
        self.peers.remove(addr)
    }

    pub fn policy(&self) -> AcceptPolicy {
        self.policy
    }

    pub fn stats(&self) -> EndpointStats {
        self.stats
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.transport.local_addr()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// In-memory transport: inbound datagrams are queued by the test,
    /// outbound ones are recorded
    #[derive(Default)]
    struct Queue {
        inbound: Mutex<VecDeque<(Vec<u8>, SocketAddr)>>,
        outbound: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    }

    impl Queue {
        fn deliver(&self, bytes: &[u8], from: SocketAddr) {
            self.inbound.lock().push_back((bytes.to_vec(), from));
        }
    }

    impl DatagramTransport for Queue {
        fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, SocketError> {
            self.outbound.lock().push((buf.to_vec(), target));
            Ok(buf.len())
        }

        fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, SocketError> {
            Ok(self.inbound.lock().pop_front().map(|(bytes, from)| {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                (n, from)
            }))
        }

        fn local_addr(&self) -> Result<SocketAddr, SocketError> {
            Ok("127.0.0.1:35555".parse().unwrap())
        }
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn datagram(sequence: u32, payload: &'static [u8]) -> Bytes {
        Datagram::new(AckHeader::new(sequence, 0, 0), Bytes::from_static(payload))
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn test_server_creates_connection_on_first_receipt() {
        let queue = Queue::default();
        let mut server = Endpoint::server(&queue, ProtocolConfig::default());
        queue.deliver(&datagram(40, b"hi"), addr(5000));

        let mut buf = [0u8; 256];
        let received = server.poll(&mut buf).unwrap().unwrap();

        assert_eq!(received.peer, addr(5000));
        assert_eq!(received.header.sequence, 40);
        assert_eq!(received.payload, Bytes::from_static(b"hi"));
        assert_eq!(server.peer(&addr(5000)).unwrap().remote_sequence(), 40);
        assert!(server.poll(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_send_stamps_header() {
        let queue = Queue::default();
        let mut server = Endpoint::server(&queue, ProtocolConfig::default());
        queue.deliver(&datagram(40, b""), addr(5000));

        let mut buf = [0u8; 256];
        server.poll(&mut buf).unwrap();
        let header = server.send(addr(5000), b"reply").unwrap();

        assert_eq!(header.sequence, 15);
        assert_eq!(header.ack, 40);
        assert_eq!(header.ack_bitfield, 1 << 31);

        let outbound = queue.outbound.lock();
        let (bytes, target) = &outbound[0];
        assert_eq!(*target, addr(5000));
        let sent = Datagram::from_bytes(bytes).unwrap();
        assert_eq!(sent.header, header);
        assert_eq!(sent.payload, Bytes::from_static(b"reply"));
    }

    #[test]
    fn test_send_to_unknown_peer() {
        let queue = Queue::default();
        let mut server = Endpoint::server(&queue, ProtocolConfig::default());
        assert!(matches!(
            server.send(addr(5000), b"x"),
            Err(EndpointError::UnknownPeer(_))
        ));
    }

    #[test]
    fn test_client_discards_unknown_sender() {
        let queue = Queue::default();
        let mut client = Endpoint::client(&queue, addr(35555), ProtocolConfig::default()).unwrap();
        queue.deliver(&datagram(99, b"spoof"), addr(6666));
        queue.deliver(&datagram(20, b"real"), addr(35555));

        let mut buf = [0u8; 256];
        let received = client.poll(&mut buf).unwrap().unwrap();

        assert_eq!(received.peer, addr(35555));
        assert_eq!(client.peer(&addr(35555)).unwrap().remote_sequence(), 20);
        assert!(client.peer(&addr(6666)).is_none());
        assert_eq!(client.stats().datagrams_discarded, 1);
        assert_eq!(client.stats().datagrams_received, 1);
    }

    #[test]
    fn test_malformed_datagram_skipped() {
        let queue = Queue::default();
        let mut server = Endpoint::server(&queue, ProtocolConfig::default());
        queue.deliver(&[1, 2, 3], addr(5000));

        let mut buf = [0u8; 256];
        assert!(server.poll(&mut buf).unwrap().is_none());
        assert!(server.peers().is_empty());
        assert_eq!(server.stats().datagrams_discarded, 1);
    }

    #[test]
    fn test_full_table_rejects_new_peer() {
        let queue = Queue::default();
        let mut server = Endpoint::new(
            &queue,
            ProtocolConfig::default(),
            AcceptPolicy::AnyPeer,
            1,
        );
        queue.deliver(&datagram(1, b""), addr(5000));
        queue.deliver(&datagram(1, b""), addr(5001));

        let mut buf = [0u8; 256];
        assert!(server.poll(&mut buf).unwrap().is_some());
        assert!(server.poll(&mut buf).unwrap().is_none());
        assert_eq!(server.peers().len(), 1);
        assert_eq!(server.stats().datagrams_discarded, 1);
    }

    #[test]
    fn test_client_registers_server() {
        let queue = Queue::default();
        let client = Endpoint::client(&queue, addr(35555), ProtocolConfig::default()).unwrap();

        assert_eq!(client.policy(), AcceptPolicy::KnownPeers);
        assert_eq!(client.peers().len(), 1);
        assert_eq!(client.peers().max_peers(), 1);
        assert!(client.peer(&addr(35555)).is_some());
    }

    #[test]
    fn test_disconnect() {
        let queue = Queue::default();
        let mut client = Endpoint::client(&queue, addr(35555), ProtocolConfig::default()).unwrap();
        assert!(client.disconnect(&addr(35555)).is_some());
        assert!(client.peers().is_empty());
    }
}
