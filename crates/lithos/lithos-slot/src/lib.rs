//! Shared pointer slots: one `Arc<T>` cell, many concurrent readers and
//! writers.
//!
//! - [`RingSlot`]: ring of usage-counted slots, no lock on either path
//! - [`MutexSlot`]: single lock around the handle, the reference baseline
//!
//! Both implement [`SharedSlot`], so harnesses and tests are written once.
//!
//! # Loom
//!
//! ```text
//! cargo test -p lithos-slot --features loom --release --lib loom_
//! ```

/// `assert!` that also stays on in release builds with the `audit` feature.
macro_rules! audit_assert {
    ($($arg:tt)*) => {
        if cfg!(any(debug_assertions, feature = "audit")) {
            assert!($($arg)*);
        }
    };
}

mod mutex_slot;
mod ring;
mod ring_slot;
mod shared;
mod sync;
mod usage;


pub use mutex_slot::MutexSlot;
pub use ring::seq_to_index;
pub use ring_slot::{DEFAULT_RING_SIZE, RingSlot};
pub use shared::SharedSlot;
pub use usage::{SENTINEL, UsageState};
