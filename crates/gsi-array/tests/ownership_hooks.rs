//! Integration test: ownership hook pairing under failures.
//!
//! Every item that passes the acquire hook must eventually pass the
//! release hook exactly once (or be handed back through `take_*`), even
//! when the zone refuses to grow the buffer midway through an operation.

use std::cell::RefCell;
use std::rc::Rc;

use gsi_array::GsiArray;
use gsi_core::{ArrayError, Counted, ErrorKind, Hooks, ItemRange};
use gsi_test_utils::FailingZone;
use gsi_zone::HeapZone;
use proptest::prelude::*;

type Log = Rc<RefCell<Vec<String>>>;

fn logging_hooks(log: &Log) -> impl gsi_core::Ownership<i32> {
    let on_acquire = Rc::clone(log);
    let on_release = Rc::clone(log);
    Hooks::new(
        move |item: &i32| -> Result<(), ArrayError> {
            on_acquire.borrow_mut().push(format!("+{item}"));
            Ok(())
        },
        move |item: i32| on_release.borrow_mut().push(format!("-{item}")),
    )
}

#[test]
fn bulk_removal_releases_last_first() {
    let zone = HeapZone::default();
    let log: Log = Rc::default();
    let mut a = GsiArray::with_policy(2, &zone, logging_hooks(&log)).unwrap();
    for v in 1..=6 {
        a.push(v).unwrap();
    }
    log.borrow_mut().clear();

    a.remove_range(ItemRange::new(1, 2).unwrap()).unwrap();
    a.remove_from(2);
    assert_eq!(a.as_slice(), &[1, 4]);
    assert_eq!(*log.borrow(), ["-3", "-2", "-6", "-5"]);

    drop(a);
    assert_eq!(log.borrow()[4..], ["-4", "-1"]);
}

#[test]
fn take_hands_ownership_back_without_release() {
    let zone = HeapZone::default();
    let log: Log = Rc::default();
    let mut a = GsiArray::with_policy(2, &zone, logging_hooks(&log)).unwrap();
    a.push(1).unwrap();
    a.push(2).unwrap();
    assert_eq!(a.take_at(0), Ok(1));
    assert_eq!(a.take_last(), Ok(2));
    a.push_no_acquire(3).unwrap();
    a.remove_last().unwrap();
    assert_eq!(*log.borrow(), ["+1", "+2", "-3"]);
}

#[test]
fn releasing_an_unacquired_item_keeps_the_limit_usable() {
    let zone = HeapZone::default();
    let policy = Counted::with_limit(4);
    let mut a = GsiArray::with_policy(2, &zone, policy.clone()).unwrap();
    a.push_no_acquire(1).unwrap();
    a.remove_at(0).unwrap();
    assert_eq!((policy.acquired(), policy.released(), policy.live()), (0, 1, 0));

    for v in 2..=5 {
        a.push(v).unwrap();
    }
    assert_eq!(policy.live(), 4);
    assert!(matches!(a.push(6), Err(ArrayError::HookRefused { .. })));
    assert_eq!(a.as_slice(), &[2, 3, 4, 5]);
}

#[test]
fn failed_growth_releases_the_acquired_item() {
    let zone = FailingZone::new(1);
    let policy = Counted::new();
    let mut a = GsiArray::with_policy(2, &zone, policy.clone()).unwrap();
    a.push(String::from("a")).unwrap();
    a.push(String::from("b")).unwrap();

    let err = a.insert_at(1, String::from("c")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailure);
    assert_eq!(a.as_slice(), &["a", "b"]);
    assert_eq!((a.capacity(), a.previous_capacity()), (2, 1));
    assert_eq!(policy.live(), 2);

    // The no-acquire path never acquired, so nothing is released.
    assert!(a.push_no_acquire(String::from("d")).is_err());
    assert_eq!(policy.released(), 1);

    zone.allow(1);
    a.insert_at(1, String::from("c")).unwrap();
    assert_eq!(a.as_slice(), &["a", "c", "b"]);
    assert_eq!(policy.live(), 3);
}

#[test]
fn construction_and_copy_fail_cleanly() {
    let empty = FailingZone::new(0);
    let err = GsiArray::<u8, _>::with_capacity_in(4, &empty).unwrap_err();
    assert!(matches!(err, ArrayError::AllocationFailed { requested: 4, .. }));

    let zone = HeapZone::default();
    let policy = Counted::new();
    let mut a = GsiArray::with_policy(2, &zone, policy.clone()).unwrap();
    a.push(1u8).unwrap();
    assert!(a.copy_in(&empty).is_err());
    assert_eq!(policy.acquired(), 1);
    assert_eq!(a.as_slice(), &[1]);
}

#[test]
fn reseeding_a_cleared_buffer_can_fail() {
    let zone = FailingZone::new(1);
    let mut a: GsiArray<u16, _> = GsiArray::with_capacity_in(6, &zone).unwrap();
    a.clear().unwrap();
    assert!(a.push(9).is_err());
    assert_eq!((a.count(), a.capacity(), a.previous_capacity()), (0, 0, 3));
    assert_eq!(zone.outstanding_blocks(), 0);

    zone.allow(1);
    a.push(9).unwrap();
    assert_eq!((a.capacity(), a.previous_capacity()), (3, 1));
}

#[derive(Clone, Debug)]
enum Op {
    Push(u8),
    InsertFront(u8),
    RemoveFront,
    RemoveLast,
    Replace(usize, u8),
    Allow(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u8>().prop_map(Op::Push),
        2 => any::<u8>().prop_map(Op::InsertFront),
        2 => Just(Op::RemoveFront),
        1 => Just(Op::RemoveLast),
        1 => (0usize..16, any::<u8>()).prop_map(|(i, v)| Op::Replace(i, v)),
        1 => (0usize..3).prop_map(Op::Allow),
    ]
}

proptest! {
    #[test]
    fn acquire_and_release_stay_paired(
        budget in 0usize..6,
        ops in proptest::collection::vec(op(), 0..80),
    ) {
        let zone = FailingZone::new(budget + 1);
        let policy = Counted::new();
        let mut a = GsiArray::with_policy(2, &zone, policy.clone()).unwrap();

        for op in ops {
            let before = (a.count(), a.capacity());
            let result = match op {
                Op::Push(v) => a.push(v),
                Op::InsertFront(v) => a.insert_at(0, v),
                Op::RemoveFront => a.remove_at(0),
                Op::RemoveLast => a.remove_last(),
                Op::Replace(i, v) => a.replace_at(i, v),
                Op::Allow(n) => {
                    zone.allow(n);
                    Ok(())
                }
            };
            if result.is_err() {
                prop_assert_eq!((a.count(), a.capacity()), before);
            }
            prop_assert_eq!(policy.live(), a.count());
        }

        drop(a);
        prop_assert_eq!(policy.acquired(), policy.released());
        prop_assert_eq!(zone.outstanding_blocks(), 0);
    }
}
