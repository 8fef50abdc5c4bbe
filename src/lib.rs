//! Relationship id caching for a graph database kernel.
//!
//! Packs the relationship ids of each (node, relationship type) pair into
//! compact varint-encoded arrays, grouped by direction, and grows them lazily
//! as relationship records are paged in from storage.

#![warn(missing_docs)]

mod error;

pub mod primitives;
pub mod storage;
pub mod types;

pub use error::{RelCacheError, Result};
