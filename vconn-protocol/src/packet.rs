//! Datagram framing
//!
//! A datagram is a fixed 12-byte ack header followed by the application
//! payload. Header fields are written in network byte order (big-endian) so
//! peers on different platforms agree on the layout.

use crate::ack::AckHeader;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Size of the ack header in bytes (3 fields × 4 bytes each)
pub const HEADER_SIZE: usize = 12;

/// Maximum payload size (MTU 1500 - IP/UDP headers - ack header)
pub const MAX_PAYLOAD_SIZE: usize = 1460; // 1500 - 28 (IP+UDP) - 12 (header)

/// Maximum size of a whole datagram
pub const MAX_DATAGRAM_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// Datagram parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Insufficient data: expected {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

impl AckHeader {
    /// Parse a header from the front of `bytes` (network byte order)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < HEADER_SIZE {
            return Err(PacketError::InsufficientData {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut buf = &bytes[..HEADER_SIZE];
        Ok(AckHeader {
            sequence: buf.get_u32(),
            ack: buf.get_u32(),
            ack_bitfield: buf.get_u32(),
        })
    }

    /// Append the header to `buf` (network byte order)
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32(self.sequence);
        buf.put_u32(self.ack);
        buf.put_u32(self.ack_bitfield);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        self.write_to(&mut buf);
        buf.freeze()
    }
}

/// Header plus application payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub header: AckHeader,
    pub payload: Bytes,
}

impl Datagram {
    pub fn new(header: AckHeader, payload: Bytes) -> Self {
        Datagram { header, payload }
    }

    /// Total encoded size in bytes
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serialize header and payload
    pub fn to_bytes(&self) -> Result<Bytes, PacketError> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(PacketError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.header.write_to(&mut buf);
        buf.put_slice(&self.payload);
        Ok(buf.freeze())
    }

    /// Parse a datagram; everything after the header is payload
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        let header = AckHeader::from_bytes(bytes)?;
        let payload = &bytes[HEADER_SIZE..];
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(PacketError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Datagram {
            header,
            payload: Bytes::copy_from_slice(payload),
        })
    }
}
