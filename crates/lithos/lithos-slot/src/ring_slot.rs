//! Ring-buffer shared pointer slot: lock-free reads, lock-minimized writes.
//!
//! A fixed ring of `N` slots, each holding an `Arc<T>` and a usage counter.
//! Readers always go through the single published slot; writers rotate through
//! the other slots looking for one they can exclusively claim, fill it, and
//! publish it.
//!
//! # Protocol
//!
//! **Reader:**
//! 1. Load the published index
//! 2. Reserve the slot (`usage += 1`), remembering the previous state
//! 3. If a writer holds the slot exclusively, drop the reservation and retry
//! 4. Clone the `Arc`
//! 5. Drop the reservation
//!
//! **Writer:**
//! 1. Take the next candidate from the write cursor
//! 2. Reserve the candidate
//! 3. If it is the published slot, drop the reservation and retry
//! 4. CAS `Referenced(1)` → `Exclusive`; on failure drop the reservation and retry
//! 5. If the candidate got published meanwhile, abandon the claim and retry
//! 6. Store the new `Arc`
//! 7. Demote `Exclusive` → `Referenced` (release)
//! 8. Publish the index
//! 9. Drop the reservation
//!
//! # Trade-offs
//!
//! - **Pros**: readers never lock and never copy `T`, only bump a refcount
//! - **Cons**: both sides spin without bound under contention; writers need
//!   at least one slot besides the published one to make progress

use crate::ring::RingCursors;
use crate::sync::{UnsafeCell, spin_loop};
use crate::usage::{UsageCounter, UsageState};
use std::fmt;
use std::sync::Arc;

#[cfg(any(debug_assertions, feature = "audit"))]
use crate::sync::{AtomicBool, Ordering};

/// Ring size used when none is given.
pub const DEFAULT_RING_SIZE: usize = 4;

/// One ring position.
#[repr(C, align(64))]
struct Slot<T> {
    usage: UsageCounter,
    value: UnsafeCell<Arc<T>>,
    /// Set while a writer holds the exclusive claim.
    #[cfg(any(debug_assertions, feature = "audit"))]
    claimed: AtomicBool,
}

impl<T> Slot<T> {
    fn new(value: Arc<T>) -> Self {
        Self {
            usage: UsageCounter::new(),
            value: UnsafeCell::new(value),
            #[cfg(any(debug_assertions, feature = "audit"))]
            claimed: AtomicBool::new(false),
        }
    }

    #[inline(always)]
    #[cfg_attr(
        not(any(debug_assertions, feature = "audit")),
        allow(unused_variables)
    )]
    fn enter_exclusive(&self, idx: usize) {
        #[cfg(any(debug_assertions, feature = "audit"))]
        assert!(
            !self.claimed.swap(true, Ordering::AcqRel),
            "slot {idx} claimed by two writers at once"
        );
    }

    #[inline(always)]
    fn leave_exclusive(&self) {
        #[cfg(any(debug_assertions, feature = "audit"))]
        self.claimed.store(false, Ordering::Release);
    }
}

/// A shared `Arc<T>` cell readable and writable from many threads without a
/// global lock.
///
/// # Type Parameters
/// - `T`: payload type; readers receive their own `Arc<T>` clone
/// - `N`: ring size, at least 2 (checked at compile time)
///
#[cfg_attr(not(feature = "loom"), doc = "```")]
#[cfg_attr(feature = "loom", doc = "```ignore")]
/// use lithos_slot::RingSlot;
/// use std::sync::Arc;
///
/// let slot: RingSlot<u64> = RingSlot::new(Arc::new(7));
/// slot.write(Arc::new(8));
/// assert_eq!(*slot.read(), 8);
/// ```
///
/// A ring of one slot would leave writers nowhere to go:
///
/// ```compile_fail
/// use lithos_slot::RingSlot;
/// let slot = RingSlot::<u64, 1>::from_value(7);
/// ```
pub struct RingSlot<T, const N: usize = DEFAULT_RING_SIZE> {
    cursors: RingCursors,
    slots: [Slot<T>; N],
}

// SAFETY: a slot's value is only written under an exclusive claim, and only
// cloned under a non-exclusive reservation; the usage counter orders the two.
// Handing out `Arc<T>` clones to other threads needs `T: Send + Sync`.
unsafe impl<T: Send + Sync, const N: usize> Sync for RingSlot<T, N> {}

impl<T, const N: usize> RingSlot<T, N> {
    const RING_SIZE_OK: () = assert!(N >= 2, "RingSlot needs at least two slots");

    /// Creates the ring with `initial` published in slot 0.
    ///
    /// The other slots hold clones of the same handle until a write replaces
    /// them; they are never published before that.
    pub fn new(initial: Arc<T>) -> Self {
        let () = Self::RING_SIZE_OK;
        Self {
            cursors: RingCursors::new(N),
            slots: std::array::from_fn(|_| Slot::new(Arc::clone(&initial))),
        }
    }

    pub fn from_value(initial: T) -> Self {
        Self::new(Arc::new(initial))
    }

    /// Returns the currently published value.
    ///
    /// Never locks; spins only while a writer is mid-replacement on the slot
    /// this reader landed on.
    pub fn read(&self) -> Arc<T> {
        loop {
            let idx = self.cursors.published();
            let slot = &self.slots[idx];

            if slot.usage.reserve().is_exclusive() {
                // Writer is filling this slot; come back through the index.
                slot.usage.release();
                spin_loop();
                continue;
            }

            // SAFETY: our reservation is live and the slot was not exclusive
            // when we took it, so no writer can claim it until we release.
            let value = slot.value.with(|ptr| unsafe { Arc::clone(&*ptr) });
            slot.usage.release();
            return value;
        }
    }

    /// Installs `value` as the published value.
    pub fn write(&self, value: Arc<T>) {
        let idx = self.claim_for_write();
        let slot = &self.slots[idx];

        slot.enter_exclusive(idx);
        self.assert_not_published(idx);
        // SAFETY: the exclusive claim keeps readers and other writers out.
        let previous = slot
            .value
            .with_mut(|ptr| unsafe { std::mem::replace(&mut *ptr, value) });
        slot.leave_exclusive();

        slot.usage.demote();
        self.cursors.publish(idx);
        slot.usage.release();

        // Payload destructors run outside the claim.
        drop(previous);
    }

    /// Spins until some non-published slot is exclusively ours.
    ///
    /// On return the slot is `Exclusive { refs: 1 }` with our reservation.
    fn claim_for_write(&self) -> usize {
        loop {
            let idx = self.cursors.next_candidate(N);
            let slot = &self.slots[idx];
            slot.usage.reserve();

            // Don't start replacing the slot readers are using.
            if idx == self.cursors.published() {
                slot.usage.release();
                spin_loop();
                continue;
            }

            if !slot.usage.try_claim() {
                slot.usage.release();
                spin_loop();
                continue;
            }

            // Another writer may have published idx and let go of it between
            // our reservation and the claim.
            if idx == self.cursors.published() {
                slot.usage.abandon();
                spin_loop();
                continue;
            }

            return idx;
        }
    }

    #[inline(always)]
    fn assert_not_published(&self, idx: usize) {
        audit_assert!(
            self.cursors.published() != idx,
            "writer is replacing the published slot {idx}"
        );
    }

    /// Index of the slot readers currently go through.
    pub fn published_index(&self) -> usize {
        self.cursors.published()
    }

    /// Racy snapshot of every slot's usage state.
    pub fn slot_states(&self) -> [UsageState; N] {
        std::array::from_fn(|i| self.slots[i].usage.state())
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for RingSlot<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingSlot")
            .field("value", &self.read())
            .field("published_index", &self.published_index())
            .field("slot_states", &self.slot_states())
            .finish()
    }
}
