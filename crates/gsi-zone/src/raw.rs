//! Low-level calls into the system allocator.
//!
//! The only module in this crate that dereferences or frees raw memory.
//! Each function carries its contract in a `# Safety` section, and each
//! `unsafe` block a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

/// Allocate a fresh block for `layout`. `None` when the system is out of memory.
pub(crate) fn alloc_bytes(layout: Layout) -> Option<NonNull<u8>> {
    assert!(layout.size() != 0, "zones do not serve zero-sized blocks");
    // SAFETY: the layout has non-zero size, checked above.
    NonNull::new(unsafe { alloc::alloc(layout) })
}

/// Resize a block obtained from [`alloc_bytes`].
///
/// On `None` the original block is untouched and still owned by the caller.
///
/// # Safety
///
/// `ptr` must be a live block from [`alloc_bytes`] or [`realloc_bytes`]
/// allocated with `layout`, and `new_size` must be non-zero and form a
/// valid layout with `layout.align()`.
pub(crate) unsafe fn realloc_bytes(
    ptr: NonNull<u8>,
    layout: Layout,
    new_size: usize,
) -> Option<NonNull<u8>> {
    // SAFETY: forwarded from the caller's contract.
    NonNull::new(unsafe { alloc::realloc(ptr.as_ptr(), layout, new_size) })
}

/// Return a block to the system allocator.
///
/// # Safety
///
/// `ptr` must be a live block from [`alloc_bytes`] or [`realloc_bytes`]
/// allocated with `layout`. It must not be used afterwards.
pub(crate) unsafe fn free_bytes(ptr: NonNull<u8>, layout: Layout) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
}

/// Copy `len` bytes between two blocks.
///
/// # Safety
///
/// Both regions must be valid for `len` bytes and must not overlap.
pub(crate) unsafe fn copy_bytes(src: NonNull<u8>, dst: NonNull<u8>, len: usize) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), len) }
}
