//! Ownership policies: the acquire/release hooks a buffer runs on items.
//!
//! A buffer calls [`Ownership::acquire`] on every item entering its storage
//! (before touching that storage) and [`Ownership::release`] on every item
//! leaving it for good. The policy is a type parameter of the buffer, so a
//! zero-sized policy like [`Owned`] costs nothing at run time.
//!
//! # Policies
//!
//! - [`Owned`]: no hooks; the buffer simply owns and drops its items.
//! - [`Counted`]: tallies acquisitions and releases, optionally capping the
//!   number of live items.
//! - [`Hooks`]: caller-supplied closures.
//! - [`KindFilter`](crate::item::KindFilter): admits only permitted
//!   [`Item`](crate::item::Item) kinds.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::ArrayError;

/// Lifecycle hooks invoked on items crossing into or out of a buffer.
pub trait Ownership<T> {
    /// Whether [`release`](Ownership::release) does anything beyond
    /// dropping the item.
    ///
    /// When `false`, the buffer may drop runs of items in bulk instead of
    /// handing each one to the hook.
    const RELEASE_HOOK: bool = true;

    /// Called before `item` is written into the buffer.
    ///
    /// An error aborts the insertion; the buffer is left untouched and the
    /// item is dropped without a matching release.
    fn acquire(&self, item: &T) -> Result<(), ArrayError> {
        let _ = item;
        Ok(())
    }

    /// Called with an item that has permanently left the buffer.
    fn release(&self, item: T) {
        drop(item);
    }
}

/// The no-op policy: items are moved in and dropped on removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Owned;

impl<T> Ownership<T> for Owned {
    const RELEASE_HOOK: bool = false;
}

#[derive(Debug, Default)]
struct Tally {
    acquired: Cell<usize>,
    released: Cell<usize>,
    live: Cell<usize>,
}

/// Counting policy.
///
/// Clones share one set of counters, so a buffer and its copies (or a
/// test holding a handle) all observe the same totals.
///
/// Items added through the no-acquire paths are still released on
/// removal, so `released` may exceed `acquired`. The live count never
/// drops below zero.
#[derive(Clone, Default)]
pub struct Counted {
    tally: Rc<Tally>,
    max_live: Option<usize>,
}

impl Counted {
    /// A counter with no live-item cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter that refuses acquisitions once `max_live` items are live.
    pub fn with_limit(max_live: usize) -> Self {
        Self {
            tally: Rc::default(),
            max_live: Some(max_live),
        }
    }

    /// Total successful acquisitions.
    pub fn acquired(&self) -> usize {
        self.tally.acquired.get()
    }

    /// Total releases.
    pub fn released(&self) -> usize {
        self.tally.released.get()
    }

    /// Items acquired but not yet released.
    pub fn live(&self) -> usize {
        self.tally.live.get()
    }
}

impl fmt::Debug for Counted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counted")
            .field("acquired", &self.acquired())
            .field("released", &self.released())
            .field("live", &self.live())
            .field("max_live", &self.max_live)
            .finish()
    }
}

impl<T> Ownership<T> for Counted {
    fn acquire(&self, _item: &T) -> Result<(), ArrayError> {
        if let Some(max) = self.max_live {
            if self.live() >= max {
                return Err(ArrayError::HookRefused {
                    reason: format!("live item limit {max} reached"),
                });
            }
        }
        self.tally.acquired.set(self.acquired() + 1);
        self.tally.live.set(self.live() + 1);
        Ok(())
    }

    fn release(&self, item: T) {
        self.tally.released.set(self.released() + 1);
        self.tally.live.set(self.live().saturating_sub(1));
        drop(item);
    }
}

/// Policy built from two closures.
///
/// ```
/// use gsi_core::{ArrayError, Hooks, Ownership};
///
/// let hooks = Hooks::new(|_: &i32| -> Result<(), ArrayError> { Ok(()) }, |_: i32| {});
/// assert!(hooks.acquire(&3).is_ok());
/// ```
#[derive(Clone)]
pub struct Hooks<A, R> {
    acquire: A,
    release: R,
}

impl<A, R> Hooks<A, R> {
    /// Wrap an acquire closure and a release closure.
    pub fn new(acquire: A, release: R) -> Self {
        Self { acquire, release }
    }
}

impl<A, R> fmt::Debug for Hooks<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

impl<T, A, R> Ownership<T> for Hooks<A, R>
where
    A: Fn(&T) -> Result<(), ArrayError>,
    R: Fn(T),
{
    fn acquire(&self, item: &T) -> Result<(), ArrayError> {
        (self.acquire)(item)
    }

    fn release(&self, item: T) {
        (self.release)(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counted_clones_share_counters() {
        let a = Counted::new();
        let b = a.clone();
        Ownership::<u32>::acquire(&a, &1).unwrap();
        Ownership::<u32>::acquire(&b, &2).unwrap();
        Ownership::<u32>::release(&a, 1);
        assert_eq!(b.acquired(), 2);
        assert_eq!(b.released(), 1);
        assert_eq!(a.live(), 1);
    }

    #[test]
    fn counted_limit_refuses_without_counting() {
        let policy = Counted::with_limit(1);
        Ownership::<u32>::acquire(&policy, &1).unwrap();
        let err = Ownership::<u32>::acquire(&policy, &2).unwrap_err();
        assert!(matches!(err, ArrayError::HookRefused { .. }));
        assert_eq!(policy.acquired(), 1);

        Ownership::<u32>::release(&policy, 1);
        assert!(Ownership::<u32>::acquire(&policy, &3).is_ok());
    }

    #[test]
    fn release_without_acquire_leaves_live_at_zero() {
        let policy = Counted::with_limit(1);
        Ownership::<u32>::release(&policy, 1);
        assert_eq!((policy.acquired(), policy.released(), policy.live()), (0, 1, 0));

        Ownership::<u32>::acquire(&policy, &2).unwrap();
        assert_eq!(policy.live(), 1);
        assert!(Ownership::<u32>::acquire(&policy, &3).is_err());
        assert_eq!(
            format!("{policy:?}"),
            "Counted { acquired: 1, released: 1, live: 1, max_live: Some(1) }"
        );
    }

    #[test]
    fn owned_declares_no_release_hook() {
        assert!(!<Owned as Ownership<String>>::RELEASE_HOOK);
        assert!(<Counted as Ownership<String>>::RELEASE_HOOK);
    }

    #[test]
    fn hooks_forward_to_closures() {
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let hooks = Hooks::new(
            |v: &i32| {
                if *v < 0 {
                    Err(ArrayError::HookRefused {
                        reason: "negative".into(),
                    })
                } else {
                    Ok(())
                }
            },
            move |v: i32| sink.set(sink.get() + v),
        );
        assert!(hooks.acquire(&-1).is_err());
        assert!(hooks.acquire(&4).is_ok());
        hooks.release(4);
        hooks.release(5);
        assert_eq!(seen.get(), 9);
    }
}
