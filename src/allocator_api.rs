//! Integration with the unstable `allocator_api`.
//!
//! With the `nightly` feature, every [`TaggedAllocator`] whose tag resolves to
//! a backend implements [`core::alloc::Allocator`], so it can back standard
//! collections through `Vec::new_in`, `Box::new_in` and friends.
//!
//! The standard trait fixes its error type, so backend errors are reported as
//! [`AllocError`]. Layouts aligned more strictly than the backend's
//! [`System::ALIGN`] are rejected the same way.

use core::{
    alloc::{AllocError, Layout},
    ptr::NonNull,
};

use crate::{select_system, SelectSystem, System, TaggedAllocator};

unsafe impl<T, Tag: SelectSystem, P> core::alloc::Allocator for TaggedAllocator<T, Tag, P> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.align() > <Tag::System as System>::ALIGN {
            return Err(AllocError);
        }
        let ptr = select_system::<Tag>().malloc(layout.size()).map_err(|_| AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, _layout: Layout) {
        unsafe { select_system::<Tag>().free(ptr) }
    }
}

#[cfg(test)]
mod tests {
    use core::alloc::Allocator;

    use super::*;
    use crate::HostTag;

    #[test]
    fn vec_in() {
        let mut values = Vec::new_in(TaggedAllocator::<u32, HostTag>::new());
        for i in 0..1000 {
            values.push(i);
        }
        assert_eq!(values.iter().sum::<u32>(), 499500);
    }

    #[test]
    fn overaligned() {
        let allocator = TaggedAllocator::<u8, HostTag>::new();
        let layout = Layout::from_size_align(64, 64).unwrap();
        assert!(Allocator::allocate(&allocator, layout).is_err());
    }
}
