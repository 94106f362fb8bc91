//! Protocol tuning parameters
//!
//! The size of the sequence space, the width of the ack bitfield and the
//! capacity of each connection's history are carried as a value handed to
//! every connection at construction instead of being process-wide constants.

use crate::sequence::{SequenceSpace, DEFAULT_SEQUENCE_MODULUS};
use thiserror::Error;

/// Default number of bits in the ack bitfield
pub const DEFAULT_ACK_BITS: u32 = 32;

/// Default number of slots in a connection's sequence history
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Default first outgoing sequence number of a new connection
pub const DEFAULT_INITIAL_SEQUENCE: u32 = 15;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Sequence modulus must be at least 2, got {0}")]
    InvalidModulus(u32),

    #[error("Ack bitfield width must be between 1 and 32 bits, got {0}")]
    InvalidAckBits(u32),

    #[error("Ack window of {bits} bits does not fit in half of a {modulus}-value sequence space")]
    WindowTooWide { bits: u32, modulus: u32 },

    #[error("History capacity must be between 1 and {max}, got {actual}")]
    InvalidHistoryCapacity { actual: usize, max: usize },

    #[error("Initial sequence {initial} is outside the sequence space [0, {modulus})")]
    InitialSequenceOutOfRange { initial: u32, modulus: u32 },
}

/// Validated protocol parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    space: SequenceSpace,
    ack_bits: u32,
    history_capacity: usize,
    initial_sequence: u32,
}

impl ProtocolConfig {
    /// Create a configuration, validating every parameter
    ///
    /// The ack window must fit within half of the sequence space so that
    /// every sequence number in the window compares as older than the
    /// window's newest end.
    pub fn new(
        sequence_modulus: u32,
        ack_bits: u32,
        history_capacity: usize,
        initial_sequence: u32,
    ) -> Result<Self, ConfigError> {
        let space = SequenceSpace::new(sequence_modulus)?;

        if ack_bits == 0 || ack_bits > 32 {
            return Err(ConfigError::InvalidAckBits(ack_bits));
        }
        if ack_bits > sequence_modulus / 2 {
            return Err(ConfigError::WindowTooWide {
                bits: ack_bits,
                modulus: sequence_modulus,
            });
        }

        let max = u32::MAX as usize;
        if history_capacity == 0 || history_capacity > max {
            return Err(ConfigError::InvalidHistoryCapacity {
                actual: history_capacity,
                max,
            });
        }

        if !space.contains(initial_sequence) {
            return Err(ConfigError::InitialSequenceOutOfRange {
                initial: initial_sequence,
                modulus: sequence_modulus,
            });
        }

        Ok(ProtocolConfig {
            space,
            ack_bits,
            history_capacity,
            initial_sequence,
        })
    }

    /// Same configuration with a different first outgoing sequence number
    pub fn with_initial_sequence(self, initial_sequence: u32) -> Result<Self, ConfigError> {
        Self::new(
            self.space.modulus(),
            self.ack_bits,
            self.history_capacity,
            initial_sequence,
        )
    }

    pub fn space(&self) -> SequenceSpace {
        self.space
    }

    pub fn sequence_modulus(&self) -> u32 {
        self.space.modulus()
    }

    pub fn ack_bits(&self) -> u32 {
        self.ack_bits
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    pub fn initial_sequence(&self) -> u32 {
        self.initial_sequence
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            space: SequenceSpace::default(),
            ack_bits: DEFAULT_ACK_BITS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            initial_sequence: DEFAULT_INITIAL_SEQUENCE,
        }
    }
}
