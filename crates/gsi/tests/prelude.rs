//! The prelude is enough to build, fill, and tear down a buffer.

use gsi::prelude::*;

#[test]
fn prelude_covers_a_full_lifecycle() {
    let mut zone = BumpZone::new(ZoneConfig::new("prelude").with_segment_bytes(1024));
    {
        let filter = KindFilter::new(ItemKinds::only(ItemKind::Int).with(ItemKind::UInt));
        let mut a = GsiArray::with_policy(0, &zone, filter).unwrap();
        for v in [3i64, -1, 2] {
            a.insert_sorted(Item::from(v), |x, y| x.as_int().cmp(&y.as_int()))
                .unwrap();
        }
        a.push(Item::from(9u64)).unwrap();
        let err = a.push(Item::from('c')).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let ints: Vec<i64> = a.iter().filter_map(Item::as_int).collect();
        assert_eq!(ints, [-1, 2, 3]);
        assert_eq!(a.last_item().ok().and_then(Item::as_uint), Some(9));
        assert_eq!(
            a.items_in_range(ItemRange::new(0, 2).unwrap()).map(<[Item]>::len),
            Ok(2)
        );
    }
    assert_eq!(zone.stats().live_bytes, 0);
    zone.reset();
    assert_eq!(zone.used_bytes(), 0);
}
