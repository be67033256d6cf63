//! Allocation accounting for any backend.

use core::ptr::NonNull;

use portable_atomic::{AtomicUsize, Ordering};

use crate::System;

/// A point-in-time copy of the counters kept by [`Counting`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Successful calls to `malloc`.
    pub allocations: usize,
    /// Calls to `malloc` that the backend rejected.
    pub failures: usize,
    /// Calls to `free`.
    pub frees: usize,
    /// Total bytes requested by successful calls to `malloc`.
    pub bytes_requested: usize,
}
impl Stats {
    /// Blocks that have been allocated and not yet freed.
    pub fn live(&self) -> usize {
        self.allocations.saturating_sub(self.frees)
    }
}

/// A backend wrapper that counts the traffic going to the wrapped backend.
///
/// Like other stateful backends, a `Counting` is usually placed in a `static`
/// and reached by reference from a tag. The counters use
/// [`portable_atomic`], so this also works on targets without native atomics.
///
/// ```rust
/// use tagalloc::{Counting, HostSystem, SelectSystem, TaggedAllocator};
///
/// static COUNTED: Counting<HostSystem> = Counting::new(HostSystem);
///
/// #[derive(Clone, Copy, Default)]
/// struct CountedTag;
///
/// impl SelectSystem for CountedTag {
///     type System = &'static Counting<HostSystem>;
///
///     fn select_system(self) -> Self::System {
///         &COUNTED
///     }
/// }
///
/// let allocator = TaggedAllocator::<u16, CountedTag>::new();
/// let ptr = allocator.allocate(8).unwrap();
/// assert_eq!(COUNTED.snapshot().bytes_requested, 16);
/// unsafe { allocator.deallocate(ptr, 8) };
/// assert_eq!(COUNTED.snapshot().live(), 0);
/// ```
#[derive(Debug)]
pub struct Counting<S> {
    inner: S,
    allocations: AtomicUsize,
    failures: AtomicUsize,
    frees: AtomicUsize,
    bytes_requested: AtomicUsize,
}
impl<S> Counting<S> {
    /// Wrap a backend with zeroed counters.
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            allocations: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
            bytes_requested: AtomicUsize::new(0),
        }
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Read the current counters.
    ///
    /// The counters are read one at a time, so a snapshot taken while other
    /// threads allocate may mix values from slightly different moments.
    /// `frees` is read before `allocations`, so a snapshot never counts a free
    /// without the allocation it releases.
    pub fn snapshot(&self) -> Stats {
        let frees = self.frees.load(Ordering::Acquire);
        Stats {
            allocations: self.allocations.load(Ordering::Acquire),
            failures: self.failures.load(Ordering::Relaxed),
            frees,
            bytes_requested: self.bytes_requested.load(Ordering::Relaxed),
        }
    }
}

unsafe impl<S: System> System for Counting<S> {
    type Error = S::Error;

    const ALIGN: usize = S::ALIGN;

    fn malloc(&self, bytes: usize) -> Result<NonNull<u8>, S::Error> {
        let result = self.inner.malloc(bytes);
        if result.is_ok() {
            self.allocations.fetch_add(1, Ordering::Release);
            self.bytes_requested.fetch_add(bytes, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        self.frees.fetch_add(1, Ordering::Release);
        unsafe { self.inner.free(ptr) }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering as StdOrdering},
        Mutex,
    };

    use super::*;
    use crate::{error::Error, HostSystem, StaticArena};

    #[test]
    fn counts() {
        let counting = Counting::new(StaticArena::<Mutex<()>, 64>::new());
        let a = counting.malloc(10).unwrap();
        let b = counting.malloc(20).unwrap();
        assert_eq!(counting.malloc(64), Err(Error::Exhausted));
        unsafe { counting.free(a) };

        let stats = counting.snapshot();
        assert_eq!(
            stats,
            Stats {
                allocations: 2,
                failures: 1,
                frees: 1,
                bytes_requested: 30,
            }
        );
        assert_eq!(stats.live(), 1);
        assert_eq!(counting.inner().live_allocations(), 1);

        unsafe { counting.free(b) };
        assert_eq!(counting.snapshot().live(), 0);
    }

    #[test]
    fn live_never_underflows() {
        let stats = Stats {
            allocations: 0,
            failures: 0,
            frees: 1,
            bytes_requested: 0,
        };
        assert_eq!(stats.live(), 0);
    }

    #[test]
    fn snapshot_during_churn() {
        static COUNTED: Counting<HostSystem> = Counting::new(HostSystem);
        static DONE: AtomicBool = AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..20_000 {
                    let ptr = COUNTED.malloc(8).unwrap();
                    unsafe { COUNTED.free(ptr) };
                }
                DONE.store(true, StdOrdering::SeqCst);
            });

            while !DONE.load(StdOrdering::SeqCst) {
                let stats = COUNTED.snapshot();
                assert!(stats.frees <= stats.allocations);
            }
        });

        assert_eq!(COUNTED.snapshot().live(), 0);
        assert_eq!(COUNTED.snapshot().allocations, 20_000);
    }
}
