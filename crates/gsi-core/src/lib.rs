//! Core types and policies for gsi item buffers.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! pieces shared by the zone allocators and the buffer engine: the error
//! taxonomy, slot ranges, ownership policies, and the tagged-union
//! [`Item`] payload.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod item;
pub mod ownership;
pub mod range;

pub use error::{ArrayError, ErrorKind, ZoneError};
pub use item::{Item, ItemKind, ItemKinds, KindFilter};
pub use ownership::{Counted, Hooks, Owned, Ownership};
pub use range::{ItemRange, ParseRangeError};
