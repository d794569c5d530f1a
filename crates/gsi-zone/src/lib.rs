//! Zone (arena) allocation contexts for gsi item buffers.
//!
//! Every byte an item buffer uses comes from a [`Zone`] chosen by the
//! caller, and goes back to that same zone. Several zones with different
//! lifetimes can coexist; buffers hold the zone by value, by reference, or
//! through `Rc`/`Arc`.
//!
//! # Zones
//!
//! ```text
//! Zone (trait: allocate / reallocate / free / stats)
//! ├── HeapZone   system allocator, optional byte budget, block table
//! └── BumpZone   segment list with bump allocation, bulk reset
//! ```
//!
//! Unsafe code is confined to the `Zone` declaration, its implementations,
//! and the `raw` module that talks to the system allocator.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod bump;
pub mod config;
pub mod heap;
mod raw;
pub mod zone;

pub use bump::BumpZone;
pub use config::ZoneConfig;
pub use gsi_core::ZoneError;
pub use heap::HeapZone;
pub use zone::{Zone, ZoneStats};
