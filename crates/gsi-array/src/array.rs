//! The growable item buffer.

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::slice;

use gsi_core::{ArrayError, ItemRange, Owned, Ownership, ZoneError};
use gsi_zone::Zone;

use crate::check;
use crate::raw::Slots;

/// A contiguous, zone-allocated buffer of `T` with ownership hooks.
///
/// All storage comes from the zone `Z`. Items entering the buffer pass
/// through the policy's [`acquire`](Ownership::acquire) hook and items
/// leaving it through [`release`](Ownership::release), unless the caller
/// uses one of the `_no_acquire` / `take_*` variants that hand that
/// responsibility back to them.
///
/// Capacity grows by the previous capacity each time the buffer fills
/// (`2, 3, 5, 8, ...` from the minimum), so growth is amortised O(1)
/// without doubling.
///
/// Every fallible operation checks its arguments and reserves storage
/// before touching the items; on error the buffer is unchanged.
///
/// ```
/// use gsi_array::GsiArray;
/// use gsi_zone::HeapZone;
///
/// let zone = HeapZone::named("doc");
/// let mut names: GsiArray<&str, _> = GsiArray::with_capacity_in(0, &zone)?;
/// for name in ["carol", "alice", "bob"] {
///     names.insert_sorted(name, |a, b| a.cmp(b))?;
/// }
/// assert_eq!(names.as_slice(), &["alice", "bob", "carol"]);
/// # Ok::<(), gsi_core::ArrayError>(())
/// ```
pub struct GsiArray<T, Z: Zone, P: Ownership<T> = Owned> {
    slots: Slots<T, Z>,
    previous: usize,
    policy: P,
}

impl<T, Z: Zone, P: Ownership<T>> GsiArray<T, Z, P> {
    /// Smallest capacity a buffer is created or explicitly resized with.
    pub const MIN_CAPACITY: usize = 2;

    /// Create an empty buffer with room for `capacity` items (at least
    /// [`MIN_CAPACITY`](Self::MIN_CAPACITY)) and the default policy.
    pub fn with_capacity_in(capacity: usize, zone: Z) -> Result<Self, ArrayError>
    where
        P: Default,
    {
        Self::with_policy(capacity, zone, P::default())
    }

    /// Create an empty buffer with an explicit ownership policy.
    pub fn with_policy(capacity: usize, zone: Z, policy: P) -> Result<Self, ArrayError> {
        let capacity = capacity.max(Self::MIN_CAPACITY);
        let slots = Slots::with_capacity_in(capacity, zone).map_err(|source| {
            ArrayError::AllocationFailed {
                requested: capacity,
                source,
            }
        })?;
        let array = Self {
            slots,
            previous: capacity / 2,
            policy,
        };
        array.check();
        Ok(array)
    }

    /// Copy the buffer into `zone`.
    ///
    /// The copy has capacity `max(count, MIN_CAPACITY)`, a clone of the
    /// policy, and a clone of every item passed through that policy's
    /// acquire hook in order. If an acquisition is refused, the partial
    /// copy is dropped (releasing what it had acquired) and the error is
    /// returned.
    pub fn copy_in<Y: Zone>(&self, zone: Y) -> Result<GsiArray<T, Y, P>, ArrayError>
    where
        T: Clone,
        P: Clone,
    {
        let mut copy = GsiArray::with_policy(self.count(), zone, self.policy.clone())?;
        for item in self.iter() {
            let item = item.clone();
            copy.policy.acquire(&item)?;
            let end = copy.slots.len();
            copy.slots.insert(end, item);
        }
        copy.check();
        Ok(copy)
    }

    /// Copy the buffer into a clone of its own zone handle.
    pub fn try_clone(&self) -> Result<Self, ArrayError>
    where
        T: Clone,
        Z: Clone,
        P: Clone,
    {
        self.copy_in(self.zone().clone())
    }

    // ── Introspection ───────────────────────────────────────────

    /// Number of live items.
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Alias for [`count`](Self::count).
    pub fn len(&self) -> usize {
        self.count()
    }

    /// Returns `true` if the buffer holds no items.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Allocated slots. Zero only after [`clear`](Self::clear).
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Capacity before the most recent growth; the next growth step.
    pub fn previous_capacity(&self) -> usize {
        self.previous
    }

    /// The zone the buffer allocates from.
    ///
    /// Returning blocks to a zone is `unsafe`, so the buffer's storage
    /// cannot be freed out from under it through this handle:
    ///
    /// ```compile_fail
    /// use std::alloc::Layout;
    /// use std::ptr::NonNull;
    /// use gsi_array::GsiArray;
    /// use gsi_zone::{HeapZone, Zone};
    ///
    /// let zone = HeapZone::default();
    /// let mut a: GsiArray<u64, _> = GsiArray::with_capacity_in(4, &zone).unwrap();
    /// a.push(7).unwrap();
    /// let block = NonNull::from(a.as_slice()).cast::<u8>();
    /// a.zone().free(block, Layout::array::<u64>(4).unwrap());
    /// ```
    pub fn zone(&self) -> &Z {
        self.slots.zone()
    }

    /// The ownership policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    // ── Growth ──────────────────────────────────────────────────

    /// Grow by the previous capacity.
    ///
    /// A cleared buffer (capacity 0) is re-seeded instead: it grows to
    /// `max(previous, MIN_CAPACITY)`.
    pub fn grow(&mut self) -> Result<(), ArrayError> {
        let capacity = self.capacity();
        let (next, previous) = if capacity == 0 {
            let next = self.previous.max(Self::MIN_CAPACITY);
            (next, next / 2)
        } else {
            let next = capacity
                .checked_add(self.previous)
                .ok_or_else(|| Self::slot_overflow(capacity, self.previous))?;
            (next, capacity)
        };
        self.reallocate(next)?;
        self.previous = previous;
        self.check();
        Ok(())
    }

    /// Resize to exactly `max(capacity, MIN_CAPACITY)` slots.
    ///
    /// Shrinking is allowed down to the live item count; below it the call
    /// fails with [`ArrayError::ShrinkBelowCount`].
    pub fn grow_to(&mut self, capacity: usize) -> Result<(), ArrayError> {
        let count = self.count();
        if capacity < count {
            return Err(ArrayError::ShrinkBelowCount {
                requested: capacity,
                count,
            });
        }
        let old = self.capacity();
        let next = capacity.max(Self::MIN_CAPACITY);
        if next != old {
            self.reallocate(next)?;
        }
        self.previous = if old == 0 {
            next / 2
        } else {
            old.min(next).max(1)
        };
        self.check();
        Ok(())
    }

    fn reallocate(&mut self, next: usize) -> Result<(), ArrayError> {
        self.slots
            .reallocate(next)
            .map_err(|source| ArrayError::AllocationFailed {
                requested: next,
                source,
            })
    }

    fn slot_overflow(capacity: usize, step: usize) -> ArrayError {
        ArrayError::AllocationFailed {
            requested: usize::MAX,
            source: ZoneError::LayoutOverflow {
                slots: capacity.saturating_add(step),
                slot_size: mem::size_of::<T>(),
            },
        }
    }

    fn ensure_room(&mut self) -> Result<(), ArrayError> {
        if self.count() == self.capacity() {
            self.grow()?;
        }
        Ok(())
    }

    // ── Insertion ───────────────────────────────────────────────

    /// Insert `item` at `index`, shifting later items up.
    ///
    /// `index` may equal [`count`](Self::count). The acquire hook runs
    /// before any storage change. If growing fails after a successful
    /// acquire, the item goes to the release hook before the error is
    /// returned.
    pub fn insert_at(&mut self, index: usize, item: T) -> Result<(), ArrayError> {
        self.check_insert_index(index)?;
        self.policy.acquire(&item)?;
        self.place(index, item, true)
    }

    /// Like [`insert_at`](Self::insert_at) without calling the acquire
    /// hook. On failure the item is dropped without being released.
    pub fn insert_at_no_acquire(&mut self, index: usize, item: T) -> Result<(), ArrayError> {
        self.check_insert_index(index)?;
        self.place(index, item, false)
    }

    /// Append `item`.
    pub fn push(&mut self, item: T) -> Result<(), ArrayError> {
        self.policy.acquire(&item)?;
        let end = self.count();
        self.place(end, item, true)
    }

    /// Append `item` without calling the acquire hook.
    pub fn push_no_acquire(&mut self, item: T) -> Result<(), ArrayError> {
        let end = self.count();
        self.place(end, item, false)
    }

    fn place(&mut self, index: usize, item: T, acquired: bool) -> Result<(), ArrayError> {
        if let Err(err) = self.ensure_room() {
            if acquired {
                self.policy.release(item);
            }
            return Err(err);
        }
        self.slots.insert(index, item);
        self.check();
        Ok(())
    }

    fn check_insert_index(&self, index: usize) -> Result<(), ArrayError> {
        let count = self.count();
        if index > count {
            return Err(ArrayError::IndexOutOfBounds { index, count });
        }
        Ok(())
    }

    // ── Sorted insertion ────────────────────────────────────────

    /// Where `item` would go in a buffer sorted under `cmp`.
    ///
    /// `cmp(candidate, existing)` orders the new item against a live one.
    /// The returned index is after every existing item that compares
    /// equal, so equal keys keep their insertion order.
    pub fn insertion_position<F>(&self, item: &T, mut cmp: F) -> usize
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let items = self.as_slice();
        let mut lower = 0;
        let mut upper = items.len();
        let mut index = upper / 2;
        while lower != upper {
            match cmp(item, &items[index]) {
                Ordering::Less => upper = index,
                Ordering::Greater => lower = index + 1,
                Ordering::Equal => break,
            }
            index = lower + (upper - lower) / 2;
        }
        while index < items.len() && cmp(item, &items[index]) != Ordering::Less {
            index += 1;
        }
        index
    }

    /// Insert `item` into a buffer already sorted under `cmp`, after any
    /// equal items.
    ///
    /// With checks enabled, panics if the buffer is not non-decreasing
    /// under `cmp` afterwards.
    pub fn insert_sorted<F>(&mut self, item: T, mut cmp: F) -> Result<(), ArrayError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let index = self.insertion_position(&item, &mut cmp);
        self.insert_at(index, item)?;
        check::sorted(self.as_slice(), &mut cmp);
        Ok(())
    }

    /// Like [`insert_sorted`](Self::insert_sorted) without calling the
    /// acquire hook.
    pub fn insert_sorted_no_acquire<F>(&mut self, item: T, mut cmp: F) -> Result<(), ArrayError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let index = self.insertion_position(&item, &mut cmp);
        self.insert_at_no_acquire(index, item)?;
        check::sorted(self.as_slice(), &mut cmp);
        Ok(())
    }

    /// Returns `true` if no item compares `Greater` than its successor.
    pub fn is_sorted_by<F>(&self, mut cmp: F) -> bool
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        check::first_descent(self.as_slice(), &mut cmp).is_none()
    }

    // ── Removal ─────────────────────────────────────────────────

    /// Remove the item at `index`, shifting later items down, and release
    /// it.
    pub fn remove_at(&mut self, index: usize) -> Result<(), ArrayError> {
        let item = self.take_at(index)?;
        self.policy.release(item);
        Ok(())
    }

    /// Remove the item at `index` and hand it to the caller unreleased.
    pub fn take_at(&mut self, index: usize) -> Result<T, ArrayError> {
        self.check_index(index)?;
        let item = self.slots.remove(index);
        self.check();
        Ok(item)
    }

    /// Remove and release the last item.
    pub fn remove_last(&mut self) -> Result<(), ArrayError> {
        let item = self.take_last()?;
        self.policy.release(item);
        Ok(())
    }

    /// Remove the last item and hand it to the caller unreleased.
    pub fn take_last(&mut self) -> Result<T, ArrayError> {
        self.slots.pop().ok_or(ArrayError::Empty)
    }

    /// Release every item from `index` to the end, last first.
    ///
    /// Does nothing when `index >= count`.
    pub fn remove_from(&mut self, index: usize) {
        if !P::RELEASE_HOOK {
            self.slots.truncate(index);
            return;
        }
        while self.count() > index {
            let Some(item) = self.slots.pop() else { break };
            self.policy.release(item);
        }
    }

    /// Release every item. Capacity is kept.
    pub fn remove_all(&mut self) {
        self.remove_from(0);
    }

    /// Return the storage to the zone, leaving capacity 0.
    ///
    /// Refuses with [`ArrayError::LiveItems`] while items are live; use
    /// [`empty`](Self::empty) to release them first. A later insertion
    /// re-seeds the storage.
    pub fn clear(&mut self) -> Result<(), ArrayError> {
        let count = self.count();
        if count > 0 {
            check::live_items_on_clear(self.zone().name(), count);
            return Err(ArrayError::LiveItems { count });
        }
        self.slots.release_storage();
        Ok(())
    }

    /// Release every item and return the storage to the zone.
    pub fn empty(&mut self) {
        self.remove_all();
        self.slots.release_storage();
    }

    // ── Access ──────────────────────────────────────────────────

    /// The item at `index`.
    pub fn item_at(&self, index: usize) -> Result<&T, ArrayError> {
        let count = self.count();
        self.as_slice()
            .get(index)
            .ok_or(ArrayError::IndexOutOfBounds { index, count })
    }

    /// Mutable access to the item at `index`. Hooks do not run for
    /// in-place edits.
    pub fn item_at_mut(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        let count = self.count();
        self.slots
            .as_mut_slice()
            .get_mut(index)
            .ok_or(ArrayError::IndexOutOfBounds { index, count })
    }

    /// The last item.
    pub fn last_item(&self) -> Result<&T, ArrayError> {
        self.as_slice().last().ok_or(ArrayError::Empty)
    }

    /// The live items in order.
    pub fn as_slice(&self) -> &[T] {
        self.slots.as_slice()
    }

    /// The live items in order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.slots.as_mut_slice()
    }

    /// Iterate over the live items.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Replace the item at `index`: acquire `item`, swap it in, release
    /// the old one.
    pub fn replace_at(&mut self, index: usize, item: T) -> Result<(), ArrayError> {
        self.check_index(index)?;
        self.policy.acquire(&item)?;
        let old = mem::replace(&mut self.slots.as_mut_slice()[index], item);
        self.policy.release(old);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), ArrayError> {
        let count = self.count();
        if index >= count {
            return Err(ArrayError::IndexOutOfBounds { index, count });
        }
        Ok(())
    }

    // ── Ranges ──────────────────────────────────────────────────

    /// The items covered by `range`.
    pub fn items_in_range(&self, range: ItemRange) -> Result<&[T], ArrayError> {
        range.check_within(self.count())?;
        Ok(&self.as_slice()[range.as_range()])
    }

    /// Release the items covered by `range`, last first, and close the gap.
    pub fn remove_range(&mut self, range: ItemRange) -> Result<(), ArrayError> {
        range.check_within(self.count())?;
        let policy = &self.policy;
        self.slots
            .remove_range(range.location(), range.end(), |item| policy.release(item));
        self.check();
        Ok(())
    }

    fn check(&self) {
        check::counters(self.count(), self.capacity(), self.previous);
    }
}

impl<T, Z: Zone, P: Ownership<T>> Drop for GsiArray<T, Z, P> {
    fn drop(&mut self) {
        self.empty();
    }
}

impl<T: fmt::Debug, Z: Zone, P: Ownership<T>> fmt::Debug for GsiArray<T, Z, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, Z: Zone, P: Ownership<T>> AsRef<[T]> for GsiArray<T, Z, P> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T, Z: Zone, P: Ownership<T>> IntoIterator for &'a GsiArray<T, Z, P> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
