//! A fixed-size scratch memory space.

use core::{cell::UnsafeCell, fmt::Debug, ptr::NonNull};

use crate::{error::Error, lock::Lock, System};

#[repr(C, align(16))]
struct Buffer<const N: usize>([u8; N]);

struct ArenaState {
    cursor: usize,
    live: usize,
}

/// A bump allocator over an inline buffer of `N` bytes.
///
/// The arena is meant to be placed in a `static` and returned by a tag's
/// [`SelectSystem`](crate::SelectSystem) impl, which makes it a memory space of
/// its own. Blocks are carved out of the buffer front to back. Freeing a block
/// does not make its memory available again; only once every block has been
/// returned does the arena rewind to the start of the buffer.
///
/// ```text
///   ┌──────────────────── buffer (N bytes) ────────────────────┐
///   [ block ][ block ][ block ][          free space            ]
///                             ^
///                   cursor ───┘
/// ```
///
/// Every block is aligned to 16 bytes and occupies a multiple of 16 bytes, so
/// even zero-sized requests get a distinct address.
pub struct StaticArena<L: Lock, const N: usize> {
    lock: L,
    buffer: UnsafeCell<Buffer<N>>,
    state: UnsafeCell<ArenaState>,
}

unsafe impl<L: Lock + Sync, const N: usize> Sync for StaticArena<L, N> {}

impl<L: Lock, const N: usize> StaticArena<L, N> {
    /// Create a new, empty arena.
    pub const fn new() -> Self {
        Self {
            lock: L::UNLOCKED,
            buffer: UnsafeCell::new(Buffer([0; N])),
            state: UnsafeCell::new(ArenaState { cursor: 0, live: 0 }),
        }
    }

    /// The size of the backing buffer, in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The number of bytes handed out since the arena was last rewound.
    pub fn used(&self) -> usize {
        let guard = self.lock.lock();
        let used = unsafe { (*self.state.get()).cursor };
        drop(guard);
        used
    }

    /// The number of bytes that can still be handed out before the arena is
    /// exhausted.
    pub fn free_space(&self) -> usize {
        N - self.used()
    }

    /// The number of blocks that have been allocated and not yet freed.
    pub fn live_allocations(&self) -> usize {
        let guard = self.lock.lock();
        let live = unsafe { (*self.state.get()).live };
        drop(guard);
        live
    }

    fn contains(&self, ptr: NonNull<u8>) -> bool {
        let start = self.buffer.get() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= start && addr < start + N
    }
}
impl<L: Lock, const N: usize> Default for StaticArena<L, N> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<L: Lock, const N: usize> System for StaticArena<L, N> {
    type Error = Error;

    const ALIGN: usize = 16;

    fn malloc(&self, bytes: usize) -> Result<NonNull<u8>, Error> {
        let size = bytes
            .max(1)
            .checked_next_multiple_of(Self::ALIGN)
            .ok_or(Error::Exhausted)?;

        let guard = self.lock.lock();
        let state = unsafe { &mut *self.state.get() };
        if N - state.cursor < size {
            drop(guard);
            return Err(Error::Exhausted);
        }
        let ptr = unsafe { self.buffer.get().cast::<u8>().add(state.cursor) };
        state.cursor += size;
        state.live += 1;
        drop(guard);

        log::trace!("arena handed out {size} bytes at {ptr:p}");

        // the buffer lives inside `self`, which is never null
        NonNull::new(ptr).ok_or(Error::OutOfMemory)
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        assert!(
            self.contains(ptr),
            "free was called with a pointer that does not point inside the arena"
        );

        let guard = self.lock.lock();
        let state = unsafe { &mut *self.state.get() };
        state.live -= 1;
        if state.live == 0 {
            state.cursor = 0;
            log::trace!("all blocks have been returned, rewinding arena");
        }
        drop(guard);
    }
}

impl<L: Lock, const N: usize> Debug for StaticArena<L, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let guard = self.lock.lock();
        let state = unsafe { &*self.state.get() };
        let result = f
            .debug_struct("StaticArena")
            .field("capacity", &N)
            .field("used", &state.cursor)
            .field("live", &state.live)
            .finish();
        drop(guard);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    type Arena = StaticArena<Mutex<()>, 128>;

    #[test]
    fn bump() {
        let arena = Arena::new();
        let a = arena.malloc(10).unwrap();
        let b = arena.malloc(16).unwrap();
        assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 16);
        assert_eq!(arena.used(), 32);
        assert_eq!(arena.live_allocations(), 2);
        assert_eq!(a.as_ptr() as usize % Arena::ALIGN, 0);
    }

    #[test]
    fn exhausted() {
        let arena = Arena::new();
        let block = arena.malloc(100).unwrap();
        assert_eq!(arena.free_space(), 16);
        assert_eq!(arena.malloc(17), Err(Error::Exhausted));
        assert_eq!(arena.malloc(usize::MAX), Err(Error::Exhausted));
        arena.malloc(16).unwrap();
        assert_eq!(arena.malloc(0), Err(Error::Exhausted));
        unsafe { arena.free(block) };
        assert_eq!(arena.used(), 128);
    }

    #[test]
    fn rewind() {
        let arena = Arena::new();
        let a = arena.malloc(64).unwrap();
        let b = arena.malloc(64).unwrap();
        unsafe { arena.free(a) };
        assert_eq!(arena.used(), 128);
        assert_eq!(arena.malloc(1), Err(Error::Exhausted));
        unsafe { arena.free(b) };
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.malloc(64).unwrap(), a);
    }

    #[test]
    fn zero_sized() {
        let arena = Arena::new();
        let a = arena.malloc(0).unwrap();
        let b = arena.malloc(0).unwrap();
        assert_ne!(a, b);
        unsafe {
            arena.free(a);
            arena.free(b);
        }
        assert_eq!(arena.live_allocations(), 0);
    }

    #[test]
    #[should_panic]
    fn foreign_pointer() {
        let arena = Arena::new();
        let mut outside = 0u8;
        unsafe { arena.free(NonNull::from(&mut outside)) };
    }

    #[test]
    fn shared_between_threads() {
        static ARENA: StaticArena<Mutex<()>, 4096> = StaticArena::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..8 {
                        ARENA.malloc(16).unwrap();
                    }
                });
            }
        });
        assert_eq!(ARENA.live_allocations(), 32);
        assert_eq!(ARENA.used(), 512);
    }
}
