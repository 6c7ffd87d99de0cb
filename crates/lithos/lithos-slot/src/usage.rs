//! Per-slot usage counter.
//!
//! One atomic integer carries two meanings:
//!
//! ```text
//!  raw value            state
//!  ─────────────────    ─────────────────────────────────────────────
//!  0                    Idle
//!  1 .. SENTINEL        Referenced(n): n readers/writers hold a reservation
//!  SENTINEL + n         Exclusive: one writer is replacing the value,
//!                       n reservations (including the writer's own) remain
//! ```
//!
//! Readers need a single `fetch_add` to both register and learn whether a
//! writer is mid-replacement, so the encoding stays numeric in memory. Every
//! observation leaves this module decoded as a [`UsageState`].

use crate::sync::{AtomicU32, Ordering};

/// Offset marking a slot as exclusively claimed by a writer.
///
/// Half the representable range, so reservation counts can never reach it.
pub const SENTINEL: u32 = u32::MAX / 2;

/// Decoded view of a slot's usage counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsageState {
    /// Nobody references the slot.
    Idle,
    /// This many threads hold a reservation.
    Referenced(u32),
    /// A writer owns the slot; `refs` reservations are still outstanding.
    Exclusive { refs: u32 },
}

impl UsageState {
    #[inline(always)]
    pub fn decode(raw: u32) -> Self {
        if raw >= SENTINEL {
            UsageState::Exclusive { refs: raw - SENTINEL }
        } else if raw == 0 {
            UsageState::Idle
        } else {
            UsageState::Referenced(raw)
        }
    }

    /// Number of outstanding reservations, ignoring the exclusive marker.
    #[inline(always)]
    pub fn refs(self) -> u32 {
        match self {
            UsageState::Idle => 0,
            UsageState::Referenced(n) => n,
            UsageState::Exclusive { refs } => refs,
        }
    }

    #[inline(always)]
    pub fn is_exclusive(self) -> bool {
        matches!(self, UsageState::Exclusive { .. })
    }
}

/// The atomic counter guarding one ring slot.
///
/// Transitions:
///
/// ```text
/// Idle ──reserve──▶ Referenced(n) ──try_claim (n == 1)──▶ Exclusive{1}
///   ▲                   │  ▲                                  │
///   └──────release──────┘  └──────────────demote──────────────┘
/// ```
pub(crate) struct UsageCounter {
    raw: AtomicU32,
}

impl UsageCounter {
    pub(crate) fn new() -> Self {
        Self {
            raw: AtomicU32::new(0),
        }
    }

    /// Registers one reservation and returns the state seen just before it.
    ///
    /// Acquire pairs with the `Release` of the last demotion or release, so a
    /// reservation that does not observe `Exclusive` also observes the value
    /// the last writer stored.
    #[inline(always)]
    pub(crate) fn reserve(&self) -> UsageState {
        UsageState::decode(self.raw.fetch_add(1, Ordering::Acquire))
    }

    /// Drops one reservation.
    #[inline(always)]
    pub(crate) fn release(&self) {
        let prev = UsageState::decode(self.raw.fetch_sub(1, Ordering::Release));
        audit_assert!(prev.refs() > 0, "usage counter underflow: {prev:?}");
    }

    /// Upgrades the caller's sole reservation into an exclusive claim.
    ///
    /// Succeeds only when the caller's own reservation is the only one
    /// present: `Referenced(1)` becomes `Exclusive { refs: 1 }`.
    #[inline(always)]
    pub(crate) fn try_claim(&self) -> bool {
        self.raw
            .compare_exchange(1, SENTINEL + 1, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Ends an exclusive claim, keeping the writer's reservation.
    ///
    /// Release ordering publishes the value stored under the claim to any
    /// thread whose later `reserve` reads a non-exclusive state.
    #[inline(always)]
    pub(crate) fn demote(&self) {
        let prev = UsageState::decode(self.raw.fetch_sub(SENTINEL, Ordering::AcqRel));
        audit_assert!(
            matches!(prev, UsageState::Exclusive { refs } if refs >= 1),
            "demote without an exclusive claim: {prev:?}"
        );
    }

    /// Gives up an exclusive claim and the writer's reservation together.
    #[inline(always)]
    pub(crate) fn abandon(&self) {
        let prev = UsageState::decode(self.raw.fetch_sub(SENTINEL + 1, Ordering::Release));
        audit_assert!(
            matches!(prev, UsageState::Exclusive { refs } if refs >= 1),
            "abandon without an exclusive claim: {prev:?}"
        );
    }

    #[inline(always)]
    pub(crate) fn state(&self) -> UsageState {
        UsageState::decode(self.raw.load(Ordering::Acquire))
    }
}
