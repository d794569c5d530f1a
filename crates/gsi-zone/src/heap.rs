//! A zone backed by the system allocator.
//!
//! [`HeapZone`] forwards to the global allocator but keeps a table of every
//! block it has handed out. The table lets the zone refuse foreign blocks,
//! report what is still outstanding, enforce an optional byte budget, and
//! reclaim anything left over when the zone itself is dropped.

use std::alloc::Layout;
use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

use gsi_core::ZoneError;
use indexmap::IndexMap;

use crate::config::ZoneConfig;
use crate::raw;
use crate::zone::{StatsCell, Zone, ZoneStats};

/// System-allocator zone with block tracking and an optional byte budget.
pub struct HeapZone {
    config: ZoneConfig,
    /// Block start address → (block, layout), in allocation order.
    blocks: RefCell<IndexMap<usize, (NonNull<u8>, Layout)>>,
    stats: StatsCell,
}

impl HeapZone {
    /// Create a zone from `config`.
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            config,
            blocks: RefCell::new(IndexMap::new()),
            stats: StatsCell::default(),
        }
    }

    /// Create an unbounded zone with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(ZoneConfig::new(name))
    }

    /// The zone's configuration.
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Number of blocks handed out and not yet freed.
    pub fn outstanding_blocks(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Returns `true` if `ptr` is the start of a live block of this zone.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.blocks.borrow().contains_key(&(ptr as usize))
    }

    fn check_budget(&self, requested: usize, releasing: usize) -> Result<(), ZoneError> {
        let Some(limit) = self.config.byte_limit else {
            return Ok(());
        };
        let in_use = self.stats.get().live_bytes - releasing;
        if in_use.saturating_add(requested) > limit {
            return Err(ZoneError::LimitExceeded {
                requested,
                limit,
                in_use,
            });
        }
        Ok(())
    }

    fn checked_layout(&self, ptr: NonNull<u8>, layout: Layout) {
        let blocks = self.blocks.borrow();
        match blocks.get(&(ptr.as_ptr() as usize)) {
            Some(&(_, recorded)) => assert_eq!(
                recorded, layout,
                "zone '{}': block {ptr:p} returned with a different layout",
                self.config.name
            ),
            None => panic!(
                "zone '{}': block {ptr:p} was not issued by this zone",
                self.config.name
            ),
        }
    }
}

impl Default for HeapZone {
    fn default() -> Self {
        Self::new(ZoneConfig::default())
    }
}

impl fmt::Debug for HeapZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapZone")
            .field("name", &self.config.name)
            .field("byte_limit", &self.config.byte_limit)
            .field("outstanding_blocks", &self.outstanding_blocks())
            .field("stats", &self.stats.get())
            .finish()
    }
}

#[allow(unsafe_code)]
// SAFETY: blocks come straight from the system allocator with the requested
// layout; `reallocate` uses `realloc`, which preserves contents and leaves
// the old block intact on failure; only blocks found in the table are ever
// resized or freed.
unsafe impl Zone for HeapZone {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ZoneError> {
        self.check_budget(layout.size(), 0)?;
        let ptr = raw::alloc_bytes(layout).ok_or(ZoneError::OutOfMemory {
            requested: layout.size(),
        })?;
        self.blocks
            .borrow_mut()
            .insert(ptr.as_ptr() as usize, (ptr, layout));
        self.stats.allocated(layout.size());
        Ok(ptr)
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, ZoneError> {
        self.checked_layout(ptr, old);
        let new_layout =
            Layout::from_size_align(new_size, old.align()).map_err(|_| ZoneError::LayoutOverflow {
                slots: new_size,
                slot_size: 1,
            })?;
        assert!(new_size != 0, "zones do not serve zero-sized blocks");
        if new_size > old.size() {
            self.check_budget(new_size, old.size())?;
        }
        // SAFETY: `ptr` is a live block of this zone allocated with `old`
        // (checked against the table above); `new_layout` is valid and
        // non-zero.
        let moved = unsafe { raw::realloc_bytes(ptr, old, new_size) }
            .ok_or(ZoneError::OutOfMemory { requested: new_size })?;
        let mut blocks = self.blocks.borrow_mut();
        blocks.shift_remove(&(ptr.as_ptr() as usize));
        blocks.insert(moved.as_ptr() as usize, (moved, new_layout));
        self.stats.reallocated(old.size(), new_size);
        Ok(moved)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        self.checked_layout(ptr, layout);
        self.blocks.borrow_mut().shift_remove(&(ptr.as_ptr() as usize));
        // SAFETY: the block was live in the table with this layout and has
        // just been removed from it, so it cannot be freed twice.
        unsafe { raw::free_bytes(ptr, layout) };
        self.stats.freed(layout.size());
    }

    fn stats(&self) -> ZoneStats {
        self.stats.get()
    }
}

impl Drop for HeapZone {
    fn drop(&mut self) {
        for (_, (ptr, layout)) in self.blocks.get_mut().drain(..) {
            // SAFETY: every table entry is a live block allocated with the
            // recorded layout. Nothing can reference it once the zone is
            // being dropped: buffers borrow or share the zone.
            #[allow(unsafe_code)]
            unsafe {
                raw::free_bytes(ptr, layout)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(size: usize) -> Layout {
        Layout::from_size_align(size, 8).unwrap()
    }

    #[test]
    fn allocate_and_free_balance() {
        let zone = HeapZone::named("test");
        let a = zone.allocate(layout(64)).unwrap();
        let b = zone.allocate(layout(32)).unwrap();
        assert_eq!(zone.outstanding_blocks(), 2);
        assert!(zone.owns(a.as_ptr()));
        assert_eq!(zone.stats().live_bytes, 96);

        #[allow(unsafe_code)]
        // SAFETY: both blocks are live and not used again.
        unsafe {
            zone.free(a, layout(64));
            zone.free(b, layout(32));
        }
        assert_eq!(zone.outstanding_blocks(), 0);
        assert_eq!(zone.stats().live_bytes, 0);
        assert_eq!(zone.stats().peak_bytes, 96);
        assert_eq!(zone.stats().frees, 2);
    }

    #[test]
    fn reallocate_preserves_contents() {
        let zone = HeapZone::default();
        let ptr = zone.allocate(layout(8)).unwrap();
        #[allow(unsafe_code)]
        // SAFETY: the block is 8 bytes and exclusively ours.
        unsafe {
            ptr.as_ptr().copy_from([1u8, 2, 3, 4, 5, 6, 7, 8].as_ptr(), 8)
        };
        #[allow(unsafe_code)]
        // SAFETY: `ptr` is live with `layout(8)` and replaced by `moved`.
        let moved = unsafe { zone.reallocate(ptr, layout(8), 4096) }.unwrap();
        #[allow(unsafe_code)]
        // SAFETY: the reallocated block holds at least 8 initialised bytes.
        let head = unsafe { std::slice::from_raw_parts(moved.as_ptr(), 8) };
        assert_eq!(head, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(zone.stats().live_bytes, 4096);
        assert!(zone.owns(moved.as_ptr()));
        #[allow(unsafe_code)]
        // SAFETY: `moved` is live with `layout(4096)`.
        unsafe {
            zone.free(moved, layout(4096))
        };
    }

    #[test]
    fn byte_limit_rejects_before_allocating() {
        let zone = HeapZone::new(ZoneConfig::new("bounded").with_byte_limit(100));
        let a = zone.allocate(layout(64)).unwrap();
        let err = zone.allocate(layout(64)).unwrap_err();
        assert_eq!(
            err,
            ZoneError::LimitExceeded {
                requested: 64,
                limit: 100,
                in_use: 64
            }
        );
        assert_eq!(zone.outstanding_blocks(), 1);

        // Growing in place counts only the difference.
        #[allow(unsafe_code)]
        // SAFETY: `a` is live throughout; a refused resize leaves it in place.
        unsafe {
            let a = zone.reallocate(a, layout(64), 100).unwrap();
            assert!(zone.reallocate(a, layout(100), 101).is_err());
            assert!(zone.owns(a.as_ptr()));
            zone.free(a, layout(100));
        }
    }

    #[test]
    #[should_panic(expected = "was not issued by this zone")]
    fn foreign_block_panics() {
        let mine = HeapZone::named("mine");
        let theirs = HeapZone::named("theirs");
        let ptr = theirs.allocate(layout(16)).unwrap();
        #[allow(unsafe_code)]
        // SAFETY: the zone rejects the block before touching it.
        unsafe {
            mine.free(ptr, layout(16))
        };
    }

    #[test]
    #[should_panic(expected = "different layout")]
    fn wrong_layout_panics() {
        let zone = HeapZone::default();
        let ptr = zone.allocate(layout(16)).unwrap();
        #[allow(unsafe_code)]
        // SAFETY: the zone rejects the layout before touching the block.
        unsafe {
            zone.free(ptr, layout(32))
        };
    }

    #[test]
    fn drop_reclaims_outstanding_blocks() {
        let zone = HeapZone::default();
        let _ = zone.allocate(layout(128)).unwrap();
        let _ = zone.allocate(layout(128)).unwrap();
        assert_eq!(zone.outstanding_blocks(), 2);
        drop(zone);
    }
}
