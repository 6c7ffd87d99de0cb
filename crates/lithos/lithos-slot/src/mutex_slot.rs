//! Mutex-guarded shared pointer slot.
//!
//! Every read and every write takes the same lock, so all operations are
//! totally ordered. Used as the reference implementation the ring is checked
//! and benchmarked against.

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
pub struct MutexSlot<T> {
    value: Mutex<Arc<T>>,
}

impl<T> MutexSlot<T> {
    pub fn new(initial: Arc<T>) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    pub fn from_value(initial: T) -> Self {
        Self::new(Arc::new(initial))
    }

    #[inline]
    pub fn read(&self) -> Arc<T> {
        Arc::clone(&self.value.lock())
    }

    #[inline]
    pub fn write(&self, value: Arc<T>) {
        let previous = std::mem::replace(&mut *self.value.lock(), value);
        // guard is gone; the old payload is released without holding the lock
        drop(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_last_write() {
        let slot = MutexSlot::from_value(1u32);
        assert_eq!(*slot.read(), 1);
        slot.write(Arc::new(2));
        slot.write(Arc::new(3));
        assert_eq!(*slot.read(), 3);
    }

    #[test]
    fn write_releases_previous_value() {
        let first = Arc::new(1u32);
        let slot = MutexSlot::new(Arc::clone(&first));
        assert_eq!(Arc::strong_count(&first), 2);
        slot.write(Arc::new(2));
        assert_eq!(Arc::strong_count(&first), 1);
    }
}
