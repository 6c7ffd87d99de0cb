//! Synchronization primitives used by the ring protocol.
//!
//! With the `loom` feature enabled every atomic, cell and spin hint resolves to
//! its loom counterpart so the protocol can be model-checked.

#[cfg(feature = "loom")]
pub(crate) use loom::hint::spin_loop;
#[cfg(not(feature = "loom"))]
pub(crate) use std::hint::spin_loop;

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

#[cfg(feature = "loom")]
pub(crate) use loom::cell::UnsafeCell;

/// `std::cell::UnsafeCell` behind the closure-based access API loom uses.
#[cfg(not(feature = "loom"))]
#[derive(Debug)]
pub(crate) struct UnsafeCell<T>(std::cell::UnsafeCell<T>);

#[cfg(not(feature = "loom"))]
impl<T> UnsafeCell<T> {
    #[inline(always)]
    pub(crate) fn new(value: T) -> Self {
        Self(std::cell::UnsafeCell::new(value))
    }

    #[inline(always)]
    pub(crate) fn with<R>(&self, f: impl FnOnce(*const T) -> R) -> R {
        f(self.0.get())
    }

    #[inline(always)]
    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
        f(self.0.get())
    }
}
