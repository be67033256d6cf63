//! Pointer representations.
//!
//! A [`TaggedAllocator`](crate::TaggedAllocator) hands out storage in whatever
//! pointer type its third parameter names. Raw pointers are the default, but a
//! memory space may prefer a non-null or otherwise wrapped representation.

use core::ptr::NonNull;

/// A type that can represent the address of a `T`.
///
/// # Safety
/// [`into_raw`](Pointer::into_raw) must return the exact address that was
/// passed to [`from_raw`](Pointer::from_raw).
pub unsafe trait Pointer<T>: Copy {
    /// The representation of a pointer to an immutable `T`.
    type Const: Copy;

    /// Wrap a non-null address.
    fn from_raw(ptr: NonNull<T>) -> Self;
    /// Unwrap the address.
    fn into_raw(self) -> *mut T;
    /// The address of a shared reference.
    fn const_from_ref(value: &T) -> Self::Const;
}

unsafe impl<T> Pointer<T> for *mut T {
    type Const = *const T;

    #[inline]
    fn from_raw(ptr: NonNull<T>) -> Self {
        ptr.as_ptr()
    }
    #[inline]
    fn into_raw(self) -> *mut T {
        self
    }
    #[inline]
    fn const_from_ref(value: &T) -> *const T {
        value
    }
}

unsafe impl<T> Pointer<T> for NonNull<T> {
    type Const = NonNull<T>;

    #[inline]
    fn from_raw(ptr: NonNull<T>) -> Self {
        ptr
    }
    #[inline]
    fn into_raw(self) -> *mut T {
        self.as_ptr()
    }
    #[inline]
    fn const_from_ref(value: &T) -> NonNull<T> {
        NonNull::from(value)
    }
}
