//! Non-blocking UDP socket
//!
//! socket2 is used to configure the socket (address reuse and non-blocking
//! mode); I/O then goes through the standard library socket.
//! A receive or send that would block is reported as an empty success
//! rather than an error.

use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use thiserror::Error;

/// Socket errors
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Capability to exchange datagrams with peers
///
/// Implementations must never block.
pub trait DatagramTransport {
    /// Send `buf` to `target`
    ///
    /// Returns the number of bytes sent, `0` if the socket is not ready.
    fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, SocketError>;

    /// Receive one datagram
    ///
    /// Returns `None` when nothing is waiting.
    fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, SocketError>;

    /// Local address the transport is bound to
    fn local_addr(&self) -> Result<SocketAddr, SocketError>;
}

/// Non-blocking UDP socket
#[derive(Debug)]
pub struct DatagramSocket {
    inner: UdpSocket,
}

impl DatagramSocket {
    /// Create a non-blocking socket bound to the given address
    pub fn bind(addr: SocketAddr) -> Result<Self, SocketError> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.set_nonblocking(true)?;

        Ok(DatagramSocket {
            inner: socket.into(),
        })
    }

    /// Open a non-blocking IPv4 socket on `port` across all interfaces
    ///
    /// Port `0` picks an ephemeral port.
    pub fn open(port: u16) -> Result<Self, SocketError> {
        Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Receive a datagram without reporting its sender
    ///
    /// Returns `0` when nothing is waiting.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize, SocketError> {
        match self.inner.recv(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(SocketError::Io(e)),
        }
    }
}

impl DatagramTransport for DatagramSocket {
    fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, SocketError> {
        match self.inner.send_to(buf, target) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(SocketError::Io(e)),
        }
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, SocketError> {
        match self.inner.recv_from(buf) {
            Ok((n, addr)) => Ok(Some((n, addr))),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(SocketError::Io(e)),
        }
    }

    fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        Ok(self.inner.local_addr()?)
    }
}

impl<T: DatagramTransport + ?Sized> DatagramTransport for &T {
    fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, SocketError> {
        (**self).send_to(buf, target)
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, SocketError> {
        (**self).recv_from(buf)
    }

    fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        (**self).local_addr()
    }
}
