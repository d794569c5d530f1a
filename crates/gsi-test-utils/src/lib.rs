//! Test utilities and mock types for gsi development.
//!
//! Provides keyed item fixtures with comparators for sorted-insertion
//! tests, and [`FailingZone`], a zone that refuses requests after a
//! scripted number of successes.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;

use gsi_core::ZoneError;
use gsi_zone::{HeapZone, Zone, ZoneStats};

pub use fixtures::{by_key, keyed, tags, Keyed};

/// A [`HeapZone`] that fails deterministically after N requests.
///
/// `allocate` and `reallocate` both count as requests; `free` always
/// succeeds. Failing requests report [`ZoneError::OutOfMemory`] and
/// leave existing blocks untouched.
pub struct FailingZone {
    inner: HeapZone,
    succeed_count: Cell<usize>,
    request_count: Cell<usize>,
}

impl FailingZone {
    /// Create a zone that serves `succeed_count` requests then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            inner: HeapZone::named("failing"),
            succeed_count: Cell::new(succeed_count),
            request_count: Cell::new(0),
        }
    }

    /// How many allocate/reallocate requests have been made.
    pub fn requests(&self) -> usize {
        self.request_count.get()
    }

    /// Let the next `more` requests succeed, on top of any allowance
    /// not yet used.
    pub fn allow(&self, more: usize) {
        let base = self.succeed_count.get().max(self.request_count.get());
        self.succeed_count.set(base + more);
    }

    /// Number of blocks handed out and not yet freed.
    pub fn outstanding_blocks(&self) -> usize {
        self.inner.outstanding_blocks()
    }

    fn admit(&self, requested: usize) -> Result<(), ZoneError> {
        let n = self.request_count.get();
        self.request_count.set(n + 1);
        if n >= self.succeed_count.get() {
            return Err(ZoneError::OutOfMemory { requested });
        }
        Ok(())
    }
}

#[allow(unsafe_code)]
// SAFETY: every successful request is served by the inner `HeapZone`,
// which upholds the contract; refusals happen before it is consulted.
unsafe impl Zone for FailingZone {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ZoneError> {
        self.admit(layout.size())?;
        self.inner.allocate(layout)
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, ZoneError> {
        self.admit(new_size)?;
        // SAFETY: every block this zone issues came from `inner`, and the
        // caller upholds the rest of the contract.
        unsafe { self.inner.reallocate(ptr, old, new_size) }
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: as for `reallocate`.
        unsafe { self.inner.free(ptr, layout) }
    }

    fn stats(&self) -> ZoneStats {
        self.inner.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(unsafe_code)]
    fn fails_after_scripted_successes() {
        let zone = FailingZone::new(1);
        let layout = Layout::from_size_align(16, 8).unwrap();
        let ptr = zone.allocate(layout).unwrap();
        // SAFETY: `ptr` stays live across the refused resize, is replaced by
        // the granted one, and is freed once with its final layout.
        unsafe {
            assert_eq!(
                zone.reallocate(ptr, layout, 32),
                Err(ZoneError::OutOfMemory { requested: 32 })
            );
            zone.allow(1);
            let ptr = zone.reallocate(ptr, layout, 32).unwrap();
            assert_eq!(zone.requests(), 3);
            zone.free(ptr, Layout::from_size_align(32, 8).unwrap());
        }
        assert_eq!(zone.outstanding_blocks(), 0);
    }
}
