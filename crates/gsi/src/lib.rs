//! gsi: zone-allocated generic item buffers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the gsi sub-crates. For most users, adding `gsi` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use gsi::prelude::*;
//!
//! let zone = HeapZone::named("scores");
//! let policy = Counted::new();
//! let mut scores = GsiArray::with_policy(0, &zone, policy.clone())?;
//!
//! for (player, score) in [("ann", 30), ("bo", 10), ("cy", 30), ("di", 20)] {
//!     scores.insert_sorted((score, player), |a, b| a.0.cmp(&b.0))?;
//! }
//! // Equal scores keep their arrival order.
//! let order: Vec<&str> = scores.iter().map(|&(_, p)| p).collect();
//! assert_eq!(order, ["bo", "di", "ann", "cy"]);
//!
//! scores.remove_at(0)?;
//! assert_eq!(policy.live(), 3);
//!
//! scores.empty();
//! assert_eq!(zone.stats().live_bytes, 0);
//! # Ok::<(), ArrayError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gsi-core` | Errors, ranges, ownership policies, the `Item` union |
//! | [`zone`] | `gsi-zone` | The `Zone` trait, heap and bump zones, configuration |
//! | [`array`] | `gsi-array` | The `GsiArray` buffer |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Errors, ranges, ownership policies, and payload types (`gsi-core`).
///
/// Policies implement [`types::Ownership`]; [`types::Owned`] is the
/// zero-cost default and [`types::Counted`] tracks hook calls.
pub use gsi_core as types;

/// Allocation zones (`gsi-zone`).
///
/// [`zone::HeapZone`] wraps the system allocator with block tracking and
/// an optional byte budget; [`zone::BumpZone`] carves blocks from large
/// segments.
pub use gsi_zone as zone;

/// The item buffer (`gsi-array`).
pub use gsi_array as array;

/// Common imports for typical gsi usage.
///
/// ```rust
/// use gsi::prelude::*;
/// ```
pub mod prelude {
    // Buffer
    pub use gsi_array::GsiArray;

    // Zones
    pub use gsi_zone::{BumpZone, HeapZone, Zone, ZoneConfig, ZoneStats};

    // Policies and payloads
    pub use gsi_core::{Counted, Hooks, Item, ItemKind, ItemKinds, KindFilter, Owned, Ownership};

    // Ranges and errors
    pub use gsi_core::{ArrayError, ErrorKind, ItemRange, ZoneError};
}
