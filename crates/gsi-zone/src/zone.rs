//! The allocation-context trait and its accounting.

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::Arc;

use gsi_core::ZoneError;

/// An allocation context that item buffers draw all their memory from.
///
/// Methods take `&self`; implementations keep their bookkeeping behind
/// interior mutability so that many buffers can share one zone.
///
/// Blocks are identified by their address and the [`Layout`] they were
/// requested with. Handing a block back through
/// [`reallocate`](Zone::reallocate) or [`free`](Zone::free) ends the
/// caller's ownership of it, so both are `unsafe` to call: only the owner
/// of a block may do so. Zones still check returned blocks and panic on
/// one they did not issue.
///
/// ```compile_fail
/// use std::alloc::Layout;
/// use gsi_zone::{HeapZone, Zone};
///
/// let zone = HeapZone::default();
/// let layout = Layout::new::<u64>();
/// let ptr = zone.allocate(layout).unwrap();
/// zone.free(ptr, layout); // call to unsafe function requires an unsafe block
/// ```
///
/// # Safety
///
/// Buffers write items straight into the returned memory, so implementors
/// must guarantee that:
///
/// - a block returned for `layout` is valid for reads and writes of
///   `layout.size()` bytes, aligned to `layout.align()`, and overlaps no
///   other live block until it is freed or reallocated;
/// - `reallocate` preserves the first `min(old.size(), new_size)` bytes,
///   and on error leaves the original block live and unchanged;
/// - `free` and `reallocate` never invalidate any other live block.
#[allow(unsafe_code)]
pub unsafe trait Zone {
    /// Human-readable zone name.
    fn name(&self) -> &str;

    /// Allocate a block for `layout`. `layout.size()` must be non-zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ZoneError>;

    /// Resize the block at `ptr`, previously allocated with `old`, to
    /// `new_size` bytes with the same alignment.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block allocated by this zone with layout `old`,
    /// owned by the caller. On success the old pointer must not be used
    /// again; the returned block replaces it. On error the old block is
    /// still live and still the caller's.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is not a live block of this zone.
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, ZoneError>;

    /// Return the block at `ptr`, previously allocated with `layout`.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block allocated by this zone with `layout`,
    /// owned by the caller, and must not be used after this call.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is not a live block of this zone.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);

    /// Snapshot of the zone's accounting.
    fn stats(&self) -> ZoneStats;
}

/// Accounting counters exposed by every zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZoneStats {
    /// Bytes in blocks that have been handed out and not freed.
    pub live_bytes: usize,
    /// High-water mark of `live_bytes`.
    pub peak_bytes: usize,
    /// Successful `allocate` calls.
    pub allocations: usize,
    /// Successful `reallocate` calls.
    pub reallocations: usize,
    /// `free` calls.
    pub frees: usize,
}

/// Interior-mutable [`ZoneStats`] used by the zone implementations.
#[derive(Debug, Default)]
pub(crate) struct StatsCell(Cell<ZoneStats>);

impl StatsCell {
    pub(crate) fn get(&self) -> ZoneStats {
        self.0.get()
    }

    pub(crate) fn allocated(&self, bytes: usize) {
        let mut s = self.0.get();
        s.allocations += 1;
        s.live_bytes += bytes;
        s.peak_bytes = s.peak_bytes.max(s.live_bytes);
        self.0.set(s);
    }

    pub(crate) fn reallocated(&self, old: usize, new: usize) {
        let mut s = self.0.get();
        s.reallocations += 1;
        s.live_bytes = s.live_bytes - old + new;
        s.peak_bytes = s.peak_bytes.max(s.live_bytes);
        self.0.set(s);
    }

    pub(crate) fn freed(&self, bytes: usize) {
        let mut s = self.0.get();
        s.frees += 1;
        s.live_bytes -= bytes;
        self.0.set(s);
    }

    pub(crate) fn reset_live(&self) {
        let mut s = self.0.get();
        s.live_bytes = 0;
        self.0.set(s);
    }
}

macro_rules! forward_zone {
    ($($ty:ty),*) => {
        $(
            #[allow(unsafe_code)]
            // SAFETY: every call is forwarded to the pointee, which upholds
            // the contract itself.
            unsafe impl<Z: Zone + ?Sized> Zone for $ty {
                fn name(&self) -> &str {
                    (**self).name()
                }

                fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ZoneError> {
                    (**self).allocate(layout)
                }

                unsafe fn reallocate(
                    &self,
                    ptr: NonNull<u8>,
                    old: Layout,
                    new_size: usize,
                ) -> Result<NonNull<u8>, ZoneError> {
                    // SAFETY: the caller's contract is the pointee's contract.
                    unsafe { (**self).reallocate(ptr, old, new_size) }
                }

                unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
                    // SAFETY: the caller's contract is the pointee's contract.
                    unsafe { (**self).free(ptr, layout) }
                }

                fn stats(&self) -> ZoneStats {
                    (**self).stats()
                }
            }
        )*
    };
}

forward_zone!(&Z, Rc<Z>, Arc<Z>);
