//! Sequence Number Arithmetic
//!
//! Sequence numbers live in a circular space `[0, modulus)`. Stepping wraps at
//! the boundary and "more recent" is decided by distance rather than raw
//! magnitude, so ordering keeps working across the wrap point.
//!
//! All arithmetic is done against an explicit modulus in a wider integer type;
//! nothing here relies on native integer overflow.

use crate::config::ConfigError;

/// Default size of the sequence number space
pub const DEFAULT_SEQUENCE_MODULUS: u32 = 4096;

/// Step `value` by `delta` inside `[0, modulus)`
///
/// Negative deltas are supported. Values outside the range are normalized
/// before the step.
#[inline]
pub fn wrap(delta: i32, value: u32, modulus: u32) -> u32 {
    debug_assert!(modulus > 0, "modulus must be non-zero");
    let stepped = i64::from(value) + i64::from(delta);
    stepped.rem_euclid(i64::from(modulus)) as u32
}

/// Length of the shorter arc between `a` and `b`
///
/// Symmetric, zero iff `a == b`, never larger than `modulus / 2`.
#[inline]
pub fn circular_distance(a: u32, b: u32, modulus: u32) -> u32 {
    let diff = (a % modulus).abs_diff(b % modulus);
    diff.min(modulus - diff)
}

/// Forward distance from `from` to `to`, i.e. how many increments take
/// `from` to `to`
#[inline]
pub fn forward_distance(from: u32, to: u32, modulus: u32) -> u32 {
    let m = u64::from(modulus);
    ((u64::from(to % modulus) + m - u64::from(from % modulus)) % m) as u32
}

/// Whether `a` comes after `b` once wraparound is taken into account
///
/// When `a` and `b` are exactly half the space apart the numerically larger
/// value is treated as the more recent one.
#[inline]
pub fn is_more_recent(a: u32, b: u32, modulus: u32) -> bool {
    let half = modulus / 2;
    (a > b && a - b <= half) || (b > a && b - a > half)
}

/// A circular sequence number space of a fixed size
///
/// Thin wrapper around the free functions above so that callers carry the
/// modulus with them instead of threading it through every call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SequenceSpace {
    modulus: u32,
}

impl SequenceSpace {
    /// Create a sequence space of `modulus` values
    pub fn new(modulus: u32) -> Result<Self, ConfigError> {
        if modulus < 2 {
            return Err(ConfigError::InvalidModulus(modulus));
        }
        Ok(SequenceSpace { modulus })
    }

    /// Number of distinct sequence numbers
    #[inline]
    pub fn modulus(self) -> u32 {
        self.modulus
    }

    /// Check whether a raw value is a valid member of the space
    #[inline]
    pub fn contains(self, value: u32) -> bool {
        value < self.modulus
    }

    #[inline]
    pub fn wrap(self, delta: i32, value: u32) -> u32 {
        wrap(delta, value, self.modulus)
    }

    /// The sequence number following `value`
    #[inline]
    pub fn next(self, value: u32) -> u32 {
        wrap(1, value, self.modulus)
    }

    /// The sequence number preceding `value`
    #[inline]
    pub fn prev(self, value: u32) -> u32 {
        wrap(-1, value, self.modulus)
    }

    #[inline]
    pub fn distance(self, a: u32, b: u32) -> u32 {
        circular_distance(a, b, self.modulus)
    }

    #[inline]
    pub fn forward_distance(self, from: u32, to: u32) -> u32 {
        forward_distance(from, to, self.modulus)
    }

    #[inline]
    pub fn is_more_recent(self, a: u32, b: u32) -> bool {
        is_more_recent(a, b, self.modulus)
    }
}

impl Default for SequenceSpace {
    fn default() -> Self {
        SequenceSpace {
            modulus: DEFAULT_SEQUENCE_MODULUS,
        }
    }
}
