//! Demo payload carried after the ack header

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

const TAG_COUNTER: u8 = 0;
const TAG_SHUTDOWN: u8 = 1;

/// Encoded size of a message
pub const MESSAGE_SIZE: usize = 5;

/// Message decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Insufficient data: expected {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Unknown message tag: {0}")]
    UnknownTag(u8),
}

/// Payload exchanged by the demo client and server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoMessage {
    /// Counter value, echoed back incremented by the server
    Counter(i32),
    /// Tells the server to exit
    Shutdown,
}

impl DemoMessage {
    pub fn to_bytes(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(MESSAGE_SIZE);
        match self {
            DemoMessage::Counter(value) => {
                buf.put_u8(TAG_COUNTER);
                buf.put_i32(value);
            }
            DemoMessage::Shutdown => {
                buf.put_u8(TAG_SHUTDOWN);
                buf.put_i32(0);
            }
        }
        buf.freeze()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        if bytes.len() < MESSAGE_SIZE {
            return Err(MessageError::InsufficientData {
                expected: MESSAGE_SIZE,
                actual: bytes.len(),
            });
        }

        let mut buf = bytes;
        match buf.get_u8() {
            TAG_COUNTER => Ok(DemoMessage::Counter(buf.get_i32())),
            TAG_SHUTDOWN => Ok(DemoMessage::Shutdown),
            tag => Err(MessageError::UnknownTag(tag)),
        }
    }
}
