//! Resolution of tags to memory-space backends.
//!
//! A tag is a zero-sized marker type. By implementing [`SelectSystem`] for it,
//! the tag names the [`System`] whose `malloc`/`free` pair manages memory for
//! it. Resolution happens entirely through trait bounds: a tag without a
//! [`SelectSystem`] impl simply cannot be used to allocate, and the mistake is
//! reported by the compiler.
//!
//! ```compile_fail,E0599
//! use tagalloc::TaggedAllocator;
//!
//! #[derive(Clone, Copy, Default)]
//! struct Unregistered;
//!
//! let allocator = TaggedAllocator::<u32, Unregistered>::new();
//! // error[E0599]: `allocate` exists but `Unregistered: SelectSystem` is not satisfied
//! let _ = allocator.allocate(4);
//! ```

use core::ptr::NonNull;

/// A memory-space backend.
///
/// # Implementing
/// [`malloc`](System::malloc) must return a block of at least `bytes` bytes,
/// aligned to at least [`ALIGN`](System::ALIGN), or fail with
/// [`Error`](System::Error). A request for zero bytes must still produce a
/// pointer that can be passed to [`free`](System::free).
///
/// [`free`](System::free) receives only the pointer. Backends that need the
/// size of a block to release it must record it themselves.
///
/// Whatever [`malloc`](System::malloc) reports reaches the caller of
/// [`TaggedAllocator::allocate`](crate::TaggedAllocator::allocate) unchanged.
/// Backends without an error type of their own can report
/// [`Error::Other`](crate::Error::Other):
///
/// ```rust
/// use core::ptr::NonNull;
/// use tagalloc::{Error, SelectSystem, System, TaggedAllocator};
///
/// struct Detached;
///
/// unsafe impl System for Detached {
///     type Error = Error;
///
///     const ALIGN: usize = 256;
///
///     fn malloc(&self, _bytes: usize) -> Result<NonNull<u8>, Error> {
///         Err(Error::Other("no device attached"))
///     }
///
///     unsafe fn free(&self, _ptr: NonNull<u8>) {}
/// }
///
/// #[derive(Clone, Copy, Default)]
/// struct DeviceTag;
///
/// impl SelectSystem for DeviceTag {
///     type System = Detached;
///
///     fn select_system(self) -> Detached {
///         Detached
///     }
/// }
///
/// let allocator = TaggedAllocator::<f32, DeviceTag>::new();
/// assert_eq!(allocator.allocate(1024), Err(Error::Other("no device attached")));
/// ```
///
/// # Safety
/// Blocks returned by [`malloc`](System::malloc) must be valid for reads and
/// writes of the requested size, and must not overlap any other live block,
/// until they are passed to [`free`](System::free).
pub unsafe trait System {
    /// The error reported when an allocation cannot be satisfied.
    type Error;

    /// The alignment every block returned by this backend satisfies.
    const ALIGN: usize;

    /// Allocate a block of at least `bytes` bytes.
    fn malloc(&self, bytes: usize) -> Result<NonNull<u8>, Self::Error>;

    /// Release a block.
    ///
    /// # Safety
    /// `ptr` must have been returned by [`malloc`](System::malloc) on this
    /// backend and must not have been freed already.
    unsafe fn free(&self, ptr: NonNull<u8>);
}

unsafe impl<S: System + ?Sized> System for &S {
    type Error = S::Error;

    const ALIGN: usize = S::ALIGN;

    fn malloc(&self, bytes: usize) -> Result<NonNull<u8>, Self::Error> {
        (**self).malloc(bytes)
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        unsafe { (**self).free(ptr) }
    }
}

/// A tag that resolves to a [`System`].
///
/// Tags carry no data. They are constructed with [`Default`] whenever a
/// backend has to be resolved, so the resolved context only lives for the
/// duration of a single call. Backends with state are usually reached through
/// a `&'static` reference:
///
/// ```rust
/// use std::sync::Mutex;
/// use tagalloc::{SelectSystem, StaticArena, TaggedAllocator};
///
/// static SCRATCH: StaticArena<Mutex<()>, 256> = StaticArena::new();
///
/// #[derive(Clone, Copy, Default)]
/// struct ScratchTag;
///
/// impl SelectSystem for ScratchTag {
///     type System = &'static StaticArena<Mutex<()>, 256>;
///
///     fn select_system(self) -> Self::System {
///         &SCRATCH
///     }
/// }
///
/// let allocator = TaggedAllocator::<u64, ScratchTag>::new();
/// let ptr = allocator.allocate(4).unwrap();
/// assert_eq!(SCRATCH.live_allocations(), 1);
/// unsafe { allocator.deallocate(ptr, 4) };
/// assert_eq!(SCRATCH.live_allocations(), 0);
/// ```
pub trait SelectSystem: Copy + Default {
    /// The backend associated with this tag.
    type System: System;

    /// Resolve the backend for this tag.
    fn select_system(self) -> Self::System;
}

/// Resolve the backend associated with `Tag`.
#[inline]
pub fn select_system<Tag: SelectSystem>() -> Tag::System {
    Tag::default().select_system()
}
