//! Zone-allocated growable item buffer.
//!
//! [`GsiArray`] is the primitive the higher-level collections are built
//! on: a contiguous run of items whose storage comes from a caller-chosen
//! [`Zone`](gsi_zone::Zone), with per-item ownership hooks, additive
//! growth, and sorted insertion that keeps equal keys in arrival order.
//!
//! # Layers
//!
//! ```text
//! GsiArray<T, Z, P>   hooks, growth policy, bounds and range checks
//! └── Slots<T, Z>     raw slot block: shifts, reads, writes (raw.rs)
//!     └── Z: Zone     allocate / reallocate / free
//! ```
//!
//! # Checks
//!
//! Counter invariants and the sort-order check after every sorted insert
//! run in debug builds, or in any build with the `checks` feature.
//!
//! `unsafe` is confined to `raw.rs`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod array;
mod check;
mod raw;

pub use array::GsiArray;
