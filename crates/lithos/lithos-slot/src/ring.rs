//! Ring cursor arithmetic.
//!
//! Two cursors drive a [`RingSlot`](crate::RingSlot):
//! - `read_index`: the slot readers currently go through (always in `[0, N)`)
//! - `write_cursor`: a monotonically advancing counter; `write_cursor % N` is
//!   the next slot a writer tries to claim

use crate::sync::{AtomicUsize, Ordering};

/// Converts a cursor value to a ring position.
///
/// # Examples
///
/// With `capacity = 4`:
/// ```text
/// seq = 0 → 0
/// seq = 5 → 1
/// seq = 8 → 0  (wraps around)
/// ```
///
/// ```
/// use lithos_slot::seq_to_index;
/// assert_eq!(seq_to_index(5, 4), 1);
/// assert_eq!(seq_to_index(7, 3), 1);
/// ```
#[inline(always)]
pub fn seq_to_index(seq: usize, capacity: usize) -> usize {
    seq % capacity
}

/// The published index and the write cursor of a ring of `capacity` slots.
///
/// Kept on its own cache line so cursor traffic does not bounce the slot
/// counters.
#[repr(C, align(64))]
pub(crate) struct RingCursors {
    read_index: AtomicUsize,
    write_cursor: AtomicUsize,
}

impl RingCursors {
    /// Slot 0 starts published; the first write candidate is slot 1.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            read_index: AtomicUsize::new(0),
            write_cursor: AtomicUsize::new(seq_to_index(1, capacity)),
        }
    }

    /// Index of the slot readers should go through.
    ///
    /// Acquire pairs with [`publish`](Self::publish): a reader that sees a
    /// freshly published index also sees everything the publisher did first.
    #[inline(always)]
    pub(crate) fn published(&self) -> usize {
        self.read_index.load(Ordering::Acquire)
    }

    /// Takes the next write candidate.
    ///
    /// Relaxed is enough: the cursor only spreads writers across slots, the
    /// slot's usage counter decides who gets to write.
    #[inline(always)]
    pub(crate) fn next_candidate(&self, capacity: usize) -> usize {
        seq_to_index(self.write_cursor.fetch_add(1, Ordering::Relaxed), capacity)
    }

    #[inline(always)]
    pub(crate) fn publish(&self, idx: usize) {
        self.read_index.store(idx, Ordering::Release);
    }
}
