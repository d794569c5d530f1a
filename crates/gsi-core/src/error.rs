//! Error types for gsi zones and item buffers.
//!
//! Organised by subsystem: [`ZoneError`] for allocation contexts and
//! [`ArrayError`] for buffer operations. Every buffer error maps onto one of
//! the two [`ErrorKind`]s callers branch on.

use std::error::Error;
use std::fmt;

use crate::range::ItemRange;

/// The two failure classes a buffer operation can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad index, bad range, empty buffer, shrink below count, or a
    /// refused ownership hook.
    InvalidArgument,
    /// The zone could not satisfy an allocation or reallocation.
    AllocationFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::AllocationFailure => write!(f, "allocation failure"),
        }
    }
}

/// Errors reported by a zone (allocation context).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZoneError {
    /// The system allocator returned null.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
    },
    /// Satisfying the request would exceed the zone's byte budget.
    LimitExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Configured byte budget.
        limit: usize,
        /// Bytes already live in the zone.
        in_use: usize,
    },
    /// A bump zone has no segment left to serve the request.
    SegmentsExhausted {
        /// Number of bytes requested.
        requested: usize,
        /// Total bytes across all segments the zone may hold.
        capacity: usize,
    },
    /// The requested alignment is stricter than the zone supports.
    UnsupportedAlignment {
        /// Requested alignment.
        align: usize,
        /// Largest alignment the zone serves.
        max: usize,
    },
    /// `slots * slot_size` does not fit in a valid layout.
    LayoutOverflow {
        /// Number of slots requested.
        slots: usize,
        /// Size of one slot in bytes.
        slot_size: usize,
    },
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: requested {requested} bytes")
            }
            Self::LimitExceeded {
                requested,
                limit,
                in_use,
            } => {
                write!(
                    f,
                    "zone limit exceeded: requested {requested} bytes, {in_use} of {limit} bytes in use"
                )
            }
            Self::SegmentsExhausted {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "zone segments exhausted: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::UnsupportedAlignment { align, max } => {
                write!(f, "alignment {align} exceeds zone maximum {max}")
            }
            Self::LayoutOverflow { slots, slot_size } => {
                write!(f, "layout overflow: {slots} slots of {slot_size} bytes")
            }
        }
    }
}

impl Error for ZoneError {}

/// Errors from item buffer operations.
///
/// Every variant is raised before the buffer is mutated, so a caller that
/// receives one observes the buffer exactly as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// An index was at or past the end of the live items.
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Live item count at the time of the call.
        count: usize,
    },
    /// A range extended past the end of the live items.
    RangeOutOfBounds {
        /// The offending range.
        range: ItemRange,
        /// Live item count at the time of the call.
        count: usize,
    },
    /// `location + length` does not fit in a `usize`.
    RangeOverflow {
        /// Range start.
        location: usize,
        /// Range length.
        length: usize,
    },
    /// The operation needs at least one live item.
    Empty,
    /// An explicit capacity below the live item count was requested.
    ShrinkBelowCount {
        /// Requested capacity.
        requested: usize,
        /// Live item count.
        count: usize,
    },
    /// The backing storage cannot be freed while items are still live.
    LiveItems {
        /// Live item count.
        count: usize,
    },
    /// The ownership policy refused to acquire an item.
    HookRefused {
        /// Why the policy refused.
        reason: String,
    },
    /// The zone could not provide storage for the requested slot count.
    AllocationFailed {
        /// Slot capacity the buffer tried to reach.
        requested: usize,
        /// The underlying zone failure.
        source: ZoneError,
    },
}

impl ArrayError {
    /// Classify this error into one of the two buffer failure kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AllocationFailed { .. } => ErrorKind::AllocationFailure,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, count } => {
                write!(f, "index {index} out of bounds for {count} items")
            }
            Self::RangeOutOfBounds { range, count } => {
                write!(f, "range {range} extends beyond size ({count})")
            }
            Self::RangeOverflow { location, length } => {
                write!(f, "range location {location} + length {length} too great")
            }
            Self::Empty => write!(f, "buffer is empty"),
            Self::ShrinkBelowCount { requested, count } => {
                write!(
                    f,
                    "attempt to shrink below count: requested capacity {requested}, {count} live items"
                )
            }
            Self::LiveItems { count } => {
                write!(f, "cannot free storage holding {count} live items")
            }
            Self::HookRefused { reason } => write!(f, "ownership hook refused item: {reason}"),
            Self::AllocationFailed { requested, source } => {
                write!(f, "failed to grow buffer to {requested} slots: {source}")
            }
        }
    }
}

impl Error for ArrayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AllocationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
