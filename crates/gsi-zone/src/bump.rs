//! Segment-based bump zone.
//!
//! A [`BumpZone`] carves blocks out of large segments with a bump cursor.
//! Segments are only returned to the system when the zone is dropped;
//! [`BumpZone::reset`] rewinds every cursor so the memory can be reused.
//!
//! Freeing is cheap and mostly a no-op: only the most recent block of a
//! segment can be given back (the cursor rewinds to its start). The same
//! rule lets [`reallocate`](Zone::reallocate) grow or shrink the most recent
//! block in place, which is the common case for a single growing buffer.

use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ptr::NonNull;

use gsi_core::ZoneError;
use smallvec::SmallVec;

use crate::config::ZoneConfig;
use crate::raw;
use crate::zone::{StatsCell, Zone, ZoneStats};

/// Alignment of every segment base; also the largest block alignment served.
pub const SEGMENT_ALIGN: usize = 16;

/// One contiguous system allocation with a bump cursor.
struct Segment {
    base: NonNull<u8>,
    layout: Layout,
    size: usize,
    /// Next free offset.
    cursor: usize,
    /// Offset of the most recent block, if it has not been freed.
    last: Option<usize>,
}

impl Segment {
    fn new(size: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size, SEGMENT_ALIGN).ok()?;
        let base = raw::alloc_bytes(layout)?;
        Some(Self {
            base,
            layout,
            size,
            cursor: 0,
            last: None,
        })
    }

    /// Bump-allocate a block. `None` if the segment cannot fit it.
    fn alloc(&mut self, layout: Layout) -> Option<usize> {
        let start = self.cursor.checked_next_multiple_of(layout.align())?;
        let end = start.checked_add(layout.size())?;
        if end > self.size {
            return None;
        }
        self.cursor = end;
        self.last = Some(start);
        Some(start)
    }

    fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        NonNull::new(self.base.as_ptr().wrapping_add(offset))
            .unwrap_or(self.base)
    }

    /// Offset of `ptr` if `[ptr, ptr + len)` lies in the allocated part.
    fn offset_of(&self, ptr: NonNull<u8>, len: usize) -> Option<usize> {
        let base = self.base.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        let offset = addr.checked_sub(base)?;
        (offset.checked_add(len)? <= self.cursor).then_some(offset)
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.last = None;
    }
}

/// Bump-allocating zone over a bounded list of segments.
pub struct BumpZone {
    config: ZoneConfig,
    segments: RefCell<SmallVec<[Segment; 4]>>,
    /// Index of the segment currently being filled.
    current: Cell<usize>,
    stats: StatsCell,
}

impl BumpZone {
    /// Create a zone from `config`. No segment is allocated until the
    /// first request.
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            config,
            segments: RefCell::new(SmallVec::new()),
            current: Cell::new(0),
            stats: StatsCell::default(),
        }
    }

    /// Create a zone with the given name and default segment sizing.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(ZoneConfig::new(name))
    }

    /// The zone's configuration.
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Number of segments allocated so far.
    pub fn segment_count(&self) -> usize {
        self.segments.borrow().len()
    }

    /// Bytes reserved across all segments.
    pub fn reserved_bytes(&self) -> usize {
        self.segments.borrow().iter().map(|s| s.size).sum()
    }

    /// Bytes consumed by bump cursors across all segments.
    pub fn used_bytes(&self) -> usize {
        self.segments.borrow().iter().map(|s| s.cursor).sum()
    }

    /// Rewind every segment so its memory can be handed out again.
    ///
    /// Takes `&mut self`: no buffer can still be borrowing the zone.
    pub fn reset(&mut self) {
        for seg in self.segments.get_mut().iter_mut() {
            seg.reset();
        }
        self.current.set(0);
        self.stats.reset_live();
    }

    fn capacity_bytes(&self, segments: &[Segment]) -> usize {
        let unused = self.config.max_segments.saturating_sub(segments.len());
        segments.iter().map(|s| s.size).sum::<usize>()
            + unused.saturating_mul(self.config.effective_segment_bytes())
    }

    fn bump(&self, layout: Layout) -> Result<NonNull<u8>, ZoneError> {
        if layout.align() > SEGMENT_ALIGN {
            return Err(ZoneError::UnsupportedAlignment {
                align: layout.align(),
                max: SEGMENT_ALIGN,
            });
        }
        assert!(layout.size() != 0, "zones do not serve zero-sized blocks");

        let mut segments = self.segments.borrow_mut();

        // Current segment first, then any segment left over from before a reset.
        for index in self.current.get()..segments.len() {
            if let Some(offset) = segments[index].alloc(layout) {
                self.current.set(index);
                return Ok(segments[index].ptr_at(offset));
            }
        }

        if segments.len() >= self.config.max_segments {
            return Err(ZoneError::SegmentsExhausted {
                requested: layout.size(),
                capacity: self.capacity_bytes(&segments),
            });
        }

        let size = layout.size().max(self.config.effective_segment_bytes());
        let mut seg = Segment::new(size).ok_or(ZoneError::OutOfMemory { requested: size })?;
        let offset = seg
            .alloc(layout)
            .ok_or(ZoneError::OutOfMemory { requested: size })?;
        let ptr = seg.ptr_at(offset);
        segments.push(seg);
        self.current.set(segments.len() - 1);
        Ok(ptr)
    }

    /// Segment index and offset of the live block `[ptr, ptr + len)`.
    fn locate(&self, ptr: NonNull<u8>, len: usize) -> (usize, usize) {
        let segments = self.segments.borrow();
        segments
            .iter()
            .enumerate()
            .find_map(|(i, seg)| seg.offset_of(ptr, len).map(|off| (i, off)))
            .unwrap_or_else(|| {
                panic!(
                    "zone '{}': block {ptr:p} was not issued by this zone",
                    self.config.name
                )
            })
    }
}

impl Default for BumpZone {
    fn default() -> Self {
        Self::new(ZoneConfig::default())
    }
}

impl fmt::Debug for BumpZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BumpZone")
            .field("name", &self.config.name)
            .field("segments", &self.segment_count())
            .field("used_bytes", &self.used_bytes())
            .field("stats", &self.stats.get())
            .finish()
    }
}

#[allow(unsafe_code)]
// SAFETY: blocks are disjoint sub-ranges of segments owned by the zone and
// aligned by `Segment::alloc`; segments are never moved or freed before the
// zone is dropped (`reset` needs `&mut self`, so no borrower survives it);
// `reallocate` either adjusts the cursor of the most recent block or copies
// into a fresh block, leaving the old one intact on failure.
unsafe impl Zone for BumpZone {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ZoneError> {
        let ptr = self.bump(layout)?;
        self.stats.allocated(layout.size());
        Ok(ptr)
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, ZoneError> {
        assert!(new_size != 0, "zones do not serve zero-sized blocks");
        let (index, offset) = self.locate(ptr, old.size());
        {
            let mut segments = self.segments.borrow_mut();
            let seg = &mut segments[index];
            let fits = offset
                .checked_add(new_size)
                .is_some_and(|end| end <= seg.size);
            if seg.last == Some(offset) && fits {
                seg.cursor = offset + new_size;
                self.stats.reallocated(old.size(), new_size);
                return Ok(ptr);
            }
        }

        let new_layout = Layout::from_size_align(new_size, old.align()).map_err(|_| {
            ZoneError::LayoutOverflow {
                slots: new_size,
                slot_size: 1,
            }
        })?;
        let moved = self.bump(new_layout)?;
        // SAFETY: `moved` is a fresh block disjoint from the old one, and
        // both are valid for `min(old, new)` bytes.
        unsafe { raw::copy_bytes(ptr, moved, old.size().min(new_size)) };
        self.stats.reallocated(old.size(), new_size);
        Ok(moved)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        let (index, offset) = self.locate(ptr, layout.size());
        let mut segments = self.segments.borrow_mut();
        let seg = &mut segments[index];
        if seg.last == Some(offset) {
            seg.cursor = offset;
            seg.last = None;
        }
        self.stats.freed(layout.size());
    }

    fn stats(&self) -> ZoneStats {
        self.stats.get()
    }
}

impl Drop for BumpZone {
    fn drop(&mut self) {
        for seg in self.segments.get_mut().drain(..) {
            // SAFETY: each segment base was allocated in `Segment::new` with
            // its recorded layout and is freed exactly once here.
            #[allow(unsafe_code)]
            unsafe {
                raw::free_bytes(seg.base, seg.layout)
            };
        }
    }
}
