//! Slot ranges: a start location plus a length.
//!
//! [`ItemRange`] addresses a contiguous span of buffer slots. Construction
//! rejects spans whose end would overflow, so `end()` never wraps.

use std::error::Error;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::ArrayError;

/// A contiguous span of slots starting at `location`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ItemRange {
    location: usize,
    length: usize,
}

impl ItemRange {
    /// Create a range, failing with [`ArrayError::RangeOverflow`] when
    /// `location + length` does not fit in a `usize`.
    pub fn new(location: usize, length: usize) -> Result<Self, ArrayError> {
        if location.checked_add(length).is_none() {
            return Err(ArrayError::RangeOverflow { location, length });
        }
        Ok(Self { location, length })
    }

    /// The empty range at location 0.
    pub const fn empty() -> Self {
        Self {
            location: 0,
            length: 0,
        }
    }

    /// First slot in the range.
    pub fn location(&self) -> usize {
        self.location
    }

    /// Number of slots in the range.
    pub fn length(&self) -> usize {
        self.length
    }

    /// One past the last slot in the range.
    pub fn end(&self) -> usize {
        self.location + self.length
    }

    /// Returns `true` if the range covers no slots.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if `location` lies inside the range.
    pub fn contains(&self, location: usize) -> bool {
        location >= self.location && location < self.end()
    }

    /// Smallest range covering both `self` and `other`, including any gap
    /// between them.
    pub fn union(&self, other: ItemRange) -> ItemRange {
        let location = self.location.min(other.location);
        let end = self.end().max(other.end());
        ItemRange {
            location,
            length: end - location,
        }
    }

    /// Overlap of `self` and `other`.
    ///
    /// Disjoint ranges yield the empty range at location 0; ranges that
    /// merely touch yield an empty range at the shared boundary.
    pub fn intersection(&self, other: ItemRange) -> ItemRange {
        if self.end() < other.location || other.end() < self.location {
            return ItemRange::empty();
        }
        let location = self.location.max(other.location);
        let end = self.end().min(other.end());
        ItemRange {
            location,
            length: end - location,
        }
    }

    /// Check that the range fits inside a buffer of `size` live slots.
    pub fn check_within(&self, size: usize) -> Result<(), ArrayError> {
        if self.location > size || self.length > size - self.location {
            return Err(ArrayError::RangeOutOfBounds {
                range: *self,
                count: size,
            });
        }
        Ok(())
    }

    /// The equivalent half-open `std` range.
    pub fn as_range(&self) -> Range<usize> {
        self.location..self.end()
    }
}

impl fmt::Display for ItemRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{location = {}, length = {}}}",
            self.location, self.length
        )
    }
}

/// Failure to parse an [`ItemRange`] from its display form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseRangeError {
    /// The text is not of the form `{location = L, length = N}`.
    Malformed {
        /// The rejected input.
        input: String,
    },
    /// The parsed range would overflow.
    Overflow {
        /// Parsed start.
        location: usize,
        /// Parsed length.
        length: usize,
    },
}

impl fmt::Display for ParseRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { input } => write!(f, "malformed range: {input:?}"),
            Self::Overflow { location, length } => {
                write!(f, "range location {location} + length {length} too great")
            }
        }
    }
}

impl Error for ParseRangeError {}

fn field(part: &str, key: &str) -> Option<usize> {
    let (name, value) = part.split_once('=')?;
    if name.trim() != key {
        return None;
    }
    value.trim().parse().ok()
}

impl FromStr for ItemRange {
    type Err = ParseRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseRangeError::Malformed {
            input: s.to_string(),
        };
        let body = s
            .trim()
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(malformed)?;
        let (loc, len) = body.split_once(',').ok_or_else(malformed)?;
        let location = field(loc, "location").ok_or_else(malformed)?;
        let length = field(len, "length").ok_or_else(malformed)?;
        ItemRange::new(location, length)
            .map_err(|_| ParseRangeError::Overflow { location, length })
    }
}
