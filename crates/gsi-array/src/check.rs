//! Optional invariant checks for [`GsiArray`](crate::GsiArray).
//!
//! Compiled in debug builds and whenever the `checks` feature is enabled.
//! Otherwise every function here is an empty inline stub, so release
//! builds pay nothing.

use std::cmp::Ordering;

/// Panic unless the buffer's counters satisfy
/// `count <= capacity` and `1 <= previous <= capacity` (when `capacity > 0`).
#[cfg(any(debug_assertions, feature = "checks"))]
pub(crate) fn counters(count: usize, capacity: usize, previous: usize) {
    assert!(
        count <= capacity,
        "buffer invariant violated: count {count} exceeds capacity {capacity}"
    );
    assert!(
        capacity == 0 || (1..=capacity).contains(&previous),
        "buffer invariant violated: previous capacity {previous} outside 1..={capacity}"
    );
}

#[cfg(not(any(debug_assertions, feature = "checks")))]
#[inline(always)]
pub(crate) fn counters(_count: usize, _capacity: usize, _previous: usize) {}

/// Panic unless `items` is non-decreasing under `cmp`.
#[cfg(any(debug_assertions, feature = "checks"))]
pub(crate) fn sorted<T, F>(items: &[T], cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    if let Some(at) = first_descent(items, cmp) {
        panic!(
            "sorted insertion left items out of order at index {at} of {}",
            items.len()
        );
    }
}

#[cfg(not(any(debug_assertions, feature = "checks")))]
#[inline(always)]
pub(crate) fn sorted<T, F>(_items: &[T], _cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
}

/// Report a refused `clear()` on stderr.
#[cfg(debug_assertions)]
pub(crate) fn live_items_on_clear(zone: &str, count: usize) {
    eprintln!("[gsi] clear() refused in zone '{zone}': {count} items still live");
}

#[cfg(not(debug_assertions))]
#[inline(always)]
pub(crate) fn live_items_on_clear(_zone: &str, _count: usize) {}

/// Index of the first item that compares `Greater` than its successor.
pub(crate) fn first_descent<T, F>(items: &[T], cmp: &mut F) -> Option<usize>
where
    F: FnMut(&T, &T) -> Ordering,
{
    items
        .windows(2)
        .position(|pair| cmp(&pair[0], &pair[1]) == Ordering::Greater)
}
