//! Slot storage: the only code in this crate that touches raw memory.
//!
//! [`Slots`] owns one zone-allocated block of `cap` slots, of which the
//! first `len` are initialised. Its methods are safe: each one asserts the
//! preconditions that keep `[0, len)` initialised and `len <= cap`, so the
//! buffer layer above can be written without `unsafe`.
//!
//! Zero-sized item types never reach the zone; they use a dangling pointer
//! and only the counters move.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use gsi_core::ZoneError;
use gsi_zone::Zone;

pub(crate) struct Slots<T, Z: Zone> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    zone: Z,
    _owns: PhantomData<T>,
}

// SAFETY: `Slots` owns its items and its zone handle exclusively; moving it
// to another thread moves both.
unsafe impl<T: Send, Z: Zone + Send> Send for Slots<T, Z> {}

// SAFETY: shared access only hands out `&T` and `&Z`.
unsafe impl<T: Sync, Z: Zone + Sync> Sync for Slots<T, Z> {}

const fn is_zst<T>() -> bool {
    mem::size_of::<T>() == 0
}

fn layout_for<T>(slots: usize) -> Result<Layout, ZoneError> {
    Layout::array::<T>(slots).map_err(|_| ZoneError::LayoutOverflow {
        slots,
        slot_size: mem::size_of::<T>(),
    })
}

impl<T, Z: Zone> Slots<T, Z> {
    /// Allocate `cap` slots from `zone`.
    pub(crate) fn with_capacity_in(cap: usize, zone: Z) -> Result<Self, ZoneError> {
        let ptr = if is_zst::<T>() || cap == 0 {
            NonNull::dangling()
        } else {
            zone.allocate(layout_for::<T>(cap)?)?.cast()
        };
        Ok(Self {
            ptr,
            len: 0,
            cap,
            zone,
            _owns: PhantomData,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    pub(crate) fn zone(&self) -> &Z {
        &self.zone
    }

    /// Move the block to `new_cap` slots. On error nothing changes.
    ///
    /// # Panics
    ///
    /// Panics if `new_cap` is below the number of live items.
    pub(crate) fn reallocate(&mut self, new_cap: usize) -> Result<(), ZoneError> {
        assert!(new_cap >= self.len, "reallocation below live item count");
        if is_zst::<T>() {
            self.cap = new_cap;
            return Ok(());
        }
        if new_cap == 0 {
            self.release_storage();
            return Ok(());
        }
        let new_layout = layout_for::<T>(new_cap)?;
        let ptr = if self.cap == 0 {
            self.zone.allocate(new_layout)?
        } else {
            let old_layout = layout_for::<T>(self.cap)?;
            // SAFETY: `ptr` is the block this `Slots` allocated from
            // `self.zone` for `self.cap` slots and owns exclusively. It is
            // replaced below on success and untouched on error.
            unsafe {
                self.zone
                    .reallocate(self.ptr.cast(), old_layout, new_layout.size())?
            }
        };
        self.ptr = ptr.cast();
        self.cap = new_cap;
        Ok(())
    }

    /// Return the block to the zone, leaving zero capacity.
    ///
    /// # Panics
    ///
    /// Panics if items are still live.
    pub(crate) fn release_storage(&mut self) {
        assert!(self.len == 0, "releasing storage that holds live items");
        if !is_zst::<T>() && self.cap != 0 {
            // `layout_for` succeeded for this capacity when it was allocated.
            if let Ok(layout) = layout_for::<T>(self.cap) {
                // SAFETY: `ptr` is this `Slots`' own block with `layout`, and
                // is reset to dangling below, so it is never used again.
                unsafe { self.zone.free(self.ptr.cast(), layout) };
            }
        }
        self.ptr = NonNull::dangling();
        self.cap = 0;
    }

    /// Write `item` at `index`, shifting `[index, len)` up one slot.
    ///
    /// # Panics
    ///
    /// Panics if there is no spare slot or `index > len`.
    pub(crate) fn insert(&mut self, index: usize, item: T) {
        assert!(self.len < self.cap, "insert into a full slot block");
        assert!(index <= self.len, "insert index past live items");
        // SAFETY: `len < cap`, so slot `len` exists; `index <= len`, so the
        // shifted run `[index, len)` and its destination stay in the block.
        unsafe {
            let at = self.ptr.as_ptr().add(index);
            if index < self.len {
                ptr::copy(at, at.add(1), self.len - index);
            }
            ptr::write(at, item);
        }
        self.len += 1;
    }

    /// Take the item at `index`, shifting `[index + 1, len)` down one slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub(crate) fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "remove index past live items");
        // SAFETY: slot `index` is live; after reading it out, the tail is
        // moved down over it and `len` shrinks, so no slot is read twice.
        unsafe {
            let at = self.ptr.as_ptr().add(index);
            let item = ptr::read(at);
            ptr::copy(at.add(1), at, self.len - index - 1);
            self.len -= 1;
            item
        }
    }

    /// Take the last item.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was live and is now outside the live prefix.
        Some(unsafe { ptr::read(self.ptr.as_ptr().add(self.len)) })
    }

    /// Drop every item in `[new_len, len)` in place, last first.
    ///
    /// If a destructor panics, the items below it are leaked rather than
    /// dropped twice.
    pub(crate) fn truncate(&mut self, new_len: usize) {
        while self.len > new_len {
            self.len -= 1;
            // SAFETY: slot `len` was live and has just left the live prefix,
            // so it is dropped exactly once.
            unsafe { ptr::drop_in_place(self.ptr.as_ptr().add(self.len)) };
        }
    }

    /// Move the items in `[start, end)` into `sink`, last first, then close
    /// the gap.
    ///
    /// If `sink` panics, the items after `end` are leaked rather than
    /// dropped twice.
    ///
    /// # Panics
    ///
    /// Panics if `start > end` or `end > len`.
    pub(crate) fn remove_range<F: FnMut(T)>(&mut self, start: usize, end: usize, mut sink: F) {
        assert!(start <= end && end <= self.len, "range past live items");
        let tail = self.len - end;
        self.len = start;
        for index in (start..end).rev() {
            // SAFETY: each slot in `[start, end)` is live and read once;
            // `len` already excludes them.
            let item = unsafe { ptr::read(self.ptr.as_ptr().add(index)) };
            sink(item);
        }
        // SAFETY: the `tail` items after `end` are live and move down to
        // `start`; `ptr::copy` handles the overlap.
        unsafe {
            let base = self.ptr.as_ptr();
            ptr::copy(base.add(end), base.add(start), tail);
        }
        self.len = start + tail;
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialised and the pointer is aligned
        // (dangling pointers are only used with `len == 0` or ZSTs).
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for `as_slice`, with exclusive access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, Z: Zone> Drop for Slots<T, Z> {
    fn drop(&mut self) {
        self.truncate(0);
        self.release_storage();
    }
}
