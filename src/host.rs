//! The host memory space, backed by the global allocator.

use alloc::alloc::{alloc, dealloc, Layout};
use core::ptr::NonNull;

use crate::{error::Error, SelectSystem, System};

const HEADER: usize = HostSystem::ALIGN;

/// A backend that allocates from the global allocator.
///
/// Every block is preceded by a small header holding the size of the whole
/// allocation, so [`free`](System::free) can rebuild the [`Layout`] from the
/// pointer alone.
#[derive(Clone, Copy, Default, Debug)]
pub struct HostSystem;

impl HostSystem {
    fn layout_for(bytes: usize) -> Result<Layout, Error> {
        let total = bytes.checked_add(HEADER).ok_or(Error::SizeOverflow)?;
        Layout::from_size_align(total, Self::ALIGN).map_err(|_| Error::SizeOverflow)
    }
}

unsafe impl System for HostSystem {
    type Error = Error;

    const ALIGN: usize = 16;

    fn malloc(&self, bytes: usize) -> Result<NonNull<u8>, Error> {
        let layout = Self::layout_for(bytes)?;
        // the layout is never zero-sized because of the header
        let base = NonNull::new(unsafe { alloc(layout) }).ok_or(Error::OutOfMemory)?;
        unsafe {
            base.as_ptr().cast::<usize>().write(layout.size());
            Ok(NonNull::new_unchecked(base.as_ptr().add(HEADER)))
        }
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        unsafe {
            let base = ptr.as_ptr().sub(HEADER);
            let size = base.cast::<usize>().read();
            dealloc(base, Layout::from_size_align_unchecked(size, Self::ALIGN));
        }
    }
}

/// The tag for host memory.
///
/// ```rust
/// use tagalloc::{HostTag, TaggedAllocator};
///
/// let allocator = TaggedAllocator::<f32, HostTag>::new();
/// let ptr = allocator.allocate(16).unwrap();
/// unsafe {
///     ptr.write(1.5);
///     assert_eq!(ptr.read(), 1.5);
///     allocator.deallocate(ptr, 16);
/// }
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
pub struct HostTag;

impl SelectSystem for HostTag {
    type System = HostSystem;

    #[inline]
    fn select_system(self) -> HostSystem {
        HostSystem
    }
}
