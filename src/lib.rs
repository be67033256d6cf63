#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(test, doc, feature = "std")), no_std)]
#![cfg_attr(feature = "nightly", feature(allocator_api))]
#![deny(missing_docs)]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

use core::{
    any::type_name,
    fmt::Debug,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem::{align_of, size_of},
    ptr::NonNull,
};

#[doc(inline)]
pub use arena::*;
#[doc(inline)]
pub use error::*;
#[cfg(any(test, feature = "alloc"))]
#[doc(inline)]
pub use host::*;
#[doc(inline)]
pub use lock::*;
#[doc(inline)]
pub use pointer::*;
#[doc(inline)]
pub use stats::*;
#[doc(inline)]
pub use system::*;

pub mod arena;
pub mod error;
#[cfg(any(test, feature = "alloc"))]
pub mod host;
pub mod lock;
pub mod pointer;
pub mod stats;
pub mod system;

#[cfg(feature = "nightly")]
mod allocator_api;

/// The unsigned type used for element counts.
pub type SizeType = usize;

/// A stateless allocator for the memory space selected by `Tag`.
///
/// # Parameters
/// - `T` - the value type. Counts passed to [`allocate`](Self::allocate) are in
///   units of `T`.
/// - `Tag` - a zero-sized marker naming the memory space. Allocation is only
///   available when `Tag` implements [`SelectSystem`].
/// - `P` - the pointer representation handed out, `*mut T` unless otherwise
///   specified. See [`Pointer`].
///
/// The allocator holds no data at all, so every instance with the same tag is
/// interchangeable with every other. Comparing two such allocators always
/// yields equality, even when their value types or pointer representations
/// differ, and one can be rebuilt from another with
/// [`from_other`](Self::from_other) or [`rebind`](Self::rebind).
///
/// # Memory management
/// [`allocate`](Self::allocate) only hands out storage: it is uninitialized,
/// and constructing and dropping values in it is up to the caller. The request
/// is forwarded to the backend as `count * size_of::<T>()` bytes without an
/// overflow check, so callers are expected to respect
/// [`max_size`](Self::max_size). Backend failures are returned as the
/// backend's own [`System::Error`], untouched.
pub struct TaggedAllocator<T, Tag, P = *mut T> {
    _marker: PhantomData<fn() -> (*const T, Tag, P)>,
}

impl<T, Tag, P> TaggedAllocator<T, Tag, P> {
    /// Create an allocator.
    #[inline]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Create an allocator from another one with the same tag, but possibly a
    /// different value type and pointer representation.
    #[inline]
    pub const fn from_other<U, Q>(_other: &TaggedAllocator<U, Tag, Q>) -> Self {
        Self::new()
    }

    /// Turn this allocator into one for a different value type and pointer
    /// representation, keeping the tag.
    ///
    /// ```rust
    /// use tagalloc::{HostTag, TaggedAllocator};
    ///
    /// let words = TaggedAllocator::<u64, HostTag>::new();
    /// let bytes = words.rebind::<u8, *mut u8>();
    /// assert!(words == bytes);
    /// ```
    #[inline]
    pub const fn rebind<U, Q>(self) -> TaggedAllocator<U, Tag, Q> {
        TaggedAllocator::new()
    }

    /// The largest count that can be passed to [`allocate`](Self::allocate)
    /// without the byte size overflowing [`SizeType`].
    ///
    /// For zero-sized value types every count fits, so this returns
    /// [`SizeType::MAX`].
    #[inline]
    pub const fn max_size(&self) -> SizeType {
        match size_of::<T>() {
            0 => SizeType::MAX,
            size => SizeType::MAX / size,
        }
    }
}

impl<T, Tag, P: Pointer<T>> TaggedAllocator<T, Tag, P> {
    /// The address of `x`, in this allocator's pointer representation.
    #[inline]
    pub fn address(&self, x: &mut T) -> P {
        P::from_raw(NonNull::from(x))
    }

    /// The address of `x`, in this allocator's const pointer representation.
    #[inline]
    pub fn address_const(&self, x: &T) -> P::Const {
        P::const_from_ref(x)
    }
}

impl<T, Tag: SelectSystem, P: Pointer<T>> TaggedAllocator<T, Tag, P> {
    /// The backend this allocator's tag resolves to.
    #[inline]
    pub fn system(&self) -> Tag::System {
        select_system::<Tag>()
    }

    /// Allocate uninitialized storage for `count` values of `T`.
    ///
    /// # Returns
    /// A pointer to the storage, or the error reported by the backend. The
    /// storage is valid for `count` values as long as `count` does not
    /// exceed [`max_size`](Self::max_size). Larger counts wrap around when
    /// converted to bytes, and what the backend makes of the wrapped size is
    /// up to the backend.
    pub fn allocate(
        &self,
        count: SizeType,
    ) -> core::result::Result<P, <Tag::System as System>::Error> {
        debug_assert!(
            align_of::<T>() <= <Tag::System as System>::ALIGN,
            "the backend for this tag cannot satisfy the alignment of the value type"
        );

        let bytes = count.wrapping_mul(size_of::<T>());
        let raw = self.system().malloc(bytes)?;

        log::trace!(
            "allocated {count} x {} ({bytes} bytes) in {} at {raw:p}",
            type_name::<T>(),
            type_name::<Tag>()
        );

        Ok(P::from_raw(raw.cast()))
    }

    /// Release storage obtained from [`allocate`](Self::allocate).
    ///
    /// The count is accepted for symmetry with [`allocate`](Self::allocate)
    /// and is not used. Backends identify the block by its address alone.
    ///
    /// # Safety
    /// `p` must have been returned by [`allocate`](Self::allocate) on an
    /// allocator with the same tag, and must not have been released already.
    pub unsafe fn deallocate(&self, p: P, _n: SizeType) {
        let raw = p.into_raw();

        log::trace!(
            "releasing {} storage in {} at {raw:p}",
            type_name::<T>(),
            type_name::<Tag>()
        );

        unsafe { self.system().free(NonNull::new_unchecked(raw.cast())) }
    }
}

impl<T, Tag, P> Clone for TaggedAllocator<T, Tag, P> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl<T, Tag, P> Copy for TaggedAllocator<T, Tag, P> {}
impl<T, Tag, P> Default for TaggedAllocator<T, Tag, P> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
impl<T, Tag, P> Debug for TaggedAllocator<T, Tag, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "TaggedAllocator<{}, {}>",
            type_name::<T>(),
            type_name::<Tag>()
        )
    }
}

/// Allocators with the same tag are always equal.
///
/// There is no impl between allocators with different tags, so comparing them
/// does not compile:
///
/// ```compile_fail,E0369
/// use tagalloc::{HostTag, TaggedAllocator};
///
/// #[derive(Clone, Copy, Default)]
/// struct OtherTag;
///
/// let host = TaggedAllocator::<u8, HostTag>::new();
/// let other = TaggedAllocator::<u8, OtherTag>::new();
/// // error[E0369]: binary operation `==` cannot be applied
/// let _ = host == other;
/// ```
impl<T, U, Tag, P, Q> PartialEq<TaggedAllocator<U, Tag, Q>> for TaggedAllocator<T, Tag, P> {
    #[inline]
    fn eq(&self, _other: &TaggedAllocator<U, Tag, Q>) -> bool {
        true
    }
    #[allow(clippy::partialeq_ne_impl)]
    #[inline]
    fn ne(&self, _other: &TaggedAllocator<U, Tag, Q>) -> bool {
        false
    }
}
impl<T, Tag, P> Eq for TaggedAllocator<T, Tag, P> {}
impl<T, Tag, P> Hash for TaggedAllocator<T, Tag, P> {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}
