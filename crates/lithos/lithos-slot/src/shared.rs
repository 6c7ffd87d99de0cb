use crate::{MutexSlot, RingSlot};
use std::sync::Arc;

/// A single cell holding an `Arc<T>` that many threads read and replace
/// concurrently.
///
/// Implementations must never hand out a partially replaced value, and a
/// `read` that happens after a completed `write` must not return anything
/// older than that write.
pub trait SharedSlot<T>: Send + Sync {
    /// Short label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Returns the caller's own handle to the current value.
    fn read(&self) -> Arc<T>;

    /// Replaces the current value.
    fn write(&self, value: Arc<T>);
}

impl<T: Send + Sync> SharedSlot<T> for MutexSlot<T> {
    fn name(&self) -> &'static str {
        "mutex"
    }

    #[inline]
    fn read(&self) -> Arc<T> {
        MutexSlot::read(self)
    }

    #[inline]
    fn write(&self, value: Arc<T>) {
        MutexSlot::write(self, value)
    }
}

impl<T: Send + Sync, const N: usize> SharedSlot<T> for RingSlot<T, N> {
    fn name(&self) -> &'static str {
        "ring"
    }

    #[inline]
    fn read(&self) -> Arc<T> {
        RingSlot::read(self)
    }

    #[inline]
    fn write(&self, value: Arc<T>) {
        RingSlot::write(self, value)
    }
}
