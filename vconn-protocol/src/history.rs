//! Sequence history ring
//!
//! Fixed-capacity record of the most recently observed sequence numbers,
//! newest first. Storage is allocated once at construction; pushing into a
//! full ring overwrites the oldest entry. All `capacity` slots are usable,
//! emptiness is tracked with an explicit count rather than a spare slot.

use crate::sequence::wrap;
use std::iter::FusedIterator;

/// Bounded ring of recently observed sequence numbers
#[derive(Debug, Clone)]
pub struct SequenceHistory {
    /// Ring storage, never resized
    slots: Box<[u32]>,
    /// Index of the newest entry (meaningless while empty)
    newest: usize,
    /// Number of live entries
    len: usize,
}

impl SequenceHistory {
    /// Create an empty history with room for `capacity` entries
    ///
    /// # Panics
    /// Panics if capacity is zero or does not fit in a `u32`
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0 && u32::try_from(capacity).is_ok(),
            "History capacity {} out of range",
            capacity
        );
        SequenceHistory {
            slots: vec![0; capacity].into_boxed_slice(),
            newest: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Record `seq` as the newest entry
    ///
    /// Duplicates are stored like any other value. When the ring is full the
    /// oldest entry is evicted.
    pub fn push(&mut self, seq: u32) {
        let capacity = self.capacity() as u32;
        self.newest = wrap(-1, self.newest as u32, capacity) as usize;
        self.slots[self.newest] = seq;
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    /// The most recently pushed value
    pub fn newest(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(self.slots[self.newest])
        }
    }

    /// The oldest value still held
    pub fn oldest(&self) -> Option<u32> {
        self.iter().last()
    }

    /// Iterate over stored values, newest first
    ///
    /// The iterator borrows the ring and is cheap to clone, so the same
    /// snapshot can be walked more than once.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            slots: &self.slots,
            index: self.newest,
            remaining: self.len,
        }
    }

    /// Alias of [`iter`](Self::iter)
    pub fn values(&self) -> Iter<'_> {
        self.iter()
    }

    /// Whether `seq` is anywhere in the history
    pub fn contains(&self, seq: u32) -> bool {
        self.iter().any(|v| v == seq)
    }

    /// Forget every entry, keeping the allocation
    pub fn clear(&mut self) {
        self.newest = 0;
        self.len = 0;
    }
}

impl<'a> IntoIterator for &'a SequenceHistory {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Newest-first iterator over a [`SequenceHistory`]
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    slots: &'a [u32],
    index: usize,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.slots[self.index];
        self.index = wrap(1, self.index as u32, self.slots.len() as u32) as usize;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let history = SequenceHistory::new(8);
        assert!(history.is_empty());
        assert_eq!(history.newest(), None);
        assert_eq!(history.oldest(), None);
        assert_eq!(history.iter().count(), 0);
    }

    #[test]
    fn test_reverse_insertion_order() {
        let mut history = SequenceHistory::new(256);
        for seq in 0..255 {
            history.push(seq);
        }

        let values: Vec<u32> = history.values().collect();
        let expected: Vec<u32> = (0..255).rev().collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_fills_every_slot() {
        let mut history = SequenceHistory::new(4);
        for seq in [10, 11, 12, 13] {
            history.push(seq);
        }
        assert!(history.is_full());
        assert_eq!(history.values().collect::<Vec<_>>(), vec![13, 12, 11, 10]);
    }

    #[test]
    fn test_eviction_drops_single_oldest() {
        let mut history = SequenceHistory::new(256);
        for seq in 0..256 {
            history.push(seq);
        }
        assert_eq!(history.oldest(), Some(0));

        history.push(1000);
        assert_eq!(history.len(), 256);
        assert_eq!(history.newest(), Some(1000));
        assert_eq!(history.oldest(), Some(1));
        assert!(!history.contains(0));
    }

    #[test]
    fn test_duplicates_take_separate_slots() {
        let mut history = SequenceHistory::new(4);
        history.push(7);
        history.push(7);
        assert_eq!(history.len(), 2);
        assert_eq!(history.values().collect::<Vec<_>>(), vec![7, 7]);
    }

    #[test]
    fn test_out_of_order_values_kept_in_insertion_order() {
        let mut history = SequenceHistory::new(8);
        for seq in [5, 3, 9, 4] {
            history.push(seq);
        }
        assert_eq!(history.values().collect::<Vec<_>>(), vec![4, 9, 3, 5]);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let mut history = SequenceHistory::new(4);
        history.push(1);
        history.push(2);

        let iter = history.iter();
        let first: Vec<u32> = iter.clone().collect();
        let second: Vec<u32> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(history.iter().len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut history = SequenceHistory::new(4);
        history.push(1);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 4);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity() {
        SequenceHistory::new(0);
    }
}
