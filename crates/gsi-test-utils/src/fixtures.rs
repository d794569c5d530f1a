//! Keyed items for sorted-insertion tests.
//!
//! A [`Keyed`] item orders by `key` only; `tag` tells equal-key items
//! apart so tests can check where ties land.

use std::cmp::Ordering;

/// An item that sorts by `key` and carries a distinguishing `tag`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyed {
    pub key: i32,
    pub tag: String,
}

impl Keyed {
    pub fn new(key: i32, tag: impl Into<String>) -> Self {
        Self {
            key,
            tag: tag.into(),
        }
    }
}

/// Shorthand for [`Keyed::new`].
pub fn keyed(key: i32, tag: &str) -> Keyed {
    Keyed::new(key, tag)
}

/// Comparator ordering [`Keyed`] items by key alone.
pub fn by_key(candidate: &Keyed, existing: &Keyed) -> Ordering {
    candidate.key.cmp(&existing.key)
}

/// Tags of `items` in order, for compact assertions.
pub fn tags<'a>(items: impl IntoIterator<Item = &'a Keyed>) -> Vec<&'a str> {
    items.into_iter().map(|k| k.tag.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_key_ignores_tag() {
        assert_eq!(by_key(&keyed(1, "a"), &keyed(1, "b")), Ordering::Equal);
        assert_eq!(by_key(&keyed(0, "z"), &keyed(1, "a")), Ordering::Less);
        assert_eq!(tags(&[keyed(1, "a"), keyed(2, "b")]), ["a", "b"]);
    }
}
