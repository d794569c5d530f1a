//! Integration test: accounting across interleaved clients of one zone.
//!
//! Two "buffers" grow alternately out of the same zone. Whatever moves or
//! extends in place, the zone's live bytes must equal the sum of the block
//! sizes currently held, and return to zero once every block is freed.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::rc::Rc;

use gsi_zone::{BumpZone, HeapZone, Zone, ZoneConfig};

struct Block {
    ptr: NonNull<u8>,
    size: usize,
}

fn layout(size: usize) -> Layout {
    Layout::from_size_align(size, 8).unwrap()
}

fn grow_alternately<Z: Zone>(zone: &Z, rounds: usize) -> [Block; 2] {
    let mut blocks = [16, 16].map(|size| Block {
        ptr: zone.allocate(layout(size)).unwrap(),
        size,
    });
    for round in 0..rounds {
        let block = &mut blocks[round % 2];
        let new_size = block.size * 2;
        // SAFETY: `block` is live, held only here, and was sized by `layout(block.size)`.
        block.ptr = unsafe { zone.reallocate(block.ptr, layout(block.size), new_size) }.unwrap();
        block.size = new_size;
        let held: usize = blocks.iter().map(|b| b.size).sum();
        assert_eq!(zone.stats().live_bytes, held);
    }
    blocks
}

fn free_all<Z: Zone>(zone: &Z, blocks: [Block; 2]) {
    for b in blocks {
        // SAFETY: each block is live and consumed here.
        unsafe { zone.free(b.ptr, layout(b.size)) };
    }
    assert_eq!(zone.stats().live_bytes, 0);
}

#[test]
fn heap_zone_balances_interleaved_growth() {
    let zone = HeapZone::named("heap");
    let blocks = grow_alternately(&zone, 10);
    assert_eq!(zone.outstanding_blocks(), 2);
    assert_eq!(zone.stats().reallocations, 10);
    free_all(&zone, blocks);
    assert_eq!(zone.outstanding_blocks(), 0);
}

#[test]
fn bump_zone_balances_interleaved_growth() {
    let mut zone = BumpZone::new(ZoneConfig::new("bump").with_segment_bytes(1024));
    let blocks = grow_alternately(&zone, 10);
    assert!(zone.segment_count() > 1);
    free_all(&zone, blocks);

    zone.reset();
    let reserved = zone.reserved_bytes();
    let again = grow_alternately(&zone, 6);
    free_all(&zone, again);
    assert_eq!(zone.reserved_bytes(), reserved);
}

#[test]
fn shared_handles_see_one_set_of_stats() {
    let zone = Rc::new(HeapZone::named("shared"));
    let a = Rc::clone(&zone);
    let b = Rc::clone(&zone);
    let pa = a.allocate(layout(32)).unwrap();
    let pb = b.allocate(layout(64)).unwrap();
    assert_eq!(zone.stats().live_bytes, 96);
    assert_eq!(a.name(), "shared");
    // SAFETY: both blocks are live; any handle of the shared zone may return them.
    unsafe {
        b.free(pa, layout(32));
        a.free(pb, layout(64));
    }
    assert_eq!(zone.stats().frees, 2);
}
