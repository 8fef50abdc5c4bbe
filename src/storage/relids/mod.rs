//! Compact relationship id arrays.
//!
//! A node's relationships of one type are cached as a [`RelIdArray`]: up to
//! three [`IdBlock`]s (outgoing, incoming, loop) of varint-encoded ids.
//! Arrays grow while a node's relationship chain is paged in from storage and
//! are read through [`RelIdIter`]s that survive the array being replaced.
//!
//! # Key Structures
//!
//! - [`IdBlock`]: append-only byte region with a write cursor
//! - [`GrowthPolicy`]: how blocks are sized and replaced when full
//! - [`Direction`]: selects the block a write targets and the blocks a read scans
//! - [`RelIdArray`]: the per-(node, type) array; placeholder, plain or loop-capable
//! - [`RelIdIter`]: resumable cursor with per-block byte offsets
//! - [`NodeRelationships`]: per-node cache fed by a [`RelationshipSource`]
//!
//! # Sharing
//!
//! Blocks sit behind `Arc` and are copied before any write while shared, so
//! a clone of an array (an iterator holds one) is a stable snapshot. Upgrading
//! to the loop-capable variant moves the existing blocks without copying.
//! Arrays are not synchronized; one loading context owns each array.

mod array;
mod block;
mod direction;
mod iter;
mod loading;
mod merge;

use rustc_hash::FxHashSet;

use crate::types::EdgeId;

pub use array::RelIdArray;
pub use block::{
    BlockReader, GrowthPolicy, IdBlock, DEFAULT_GROWTH_FACTOR, DEFAULT_INITIAL_BLOCK_BYTES,
};
pub use direction::Direction;
pub use iter::RelIdIter;
pub use loading::{NodeRelationships, RelBatch, RelRecord, RelationshipSource};

/// Set of relationship ids, as used for exclusions.
pub type EdgeIdSet = FxHashSet<EdgeId>;
