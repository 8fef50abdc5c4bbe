use std::fmt;

use crate::error::{RelCacheError, Result};
use crate::storage::adjacency::Dir;
use crate::types::NodeId;

use super::array::RelIdArray;
use super::block::IdBlock;
use super::iter::RelIdIter;
use super::RelRecord;

/// Which id block of a [`RelIdArray`] an operation writes to, and which
/// blocks an iteration walks.
///
/// `Both` on the write side denotes a loop: a relationship whose start and end
/// node are the same.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// Relationships starting at the node.
    Outgoing,
    /// Relationships ending at the node.
    Incoming,
    /// Loops when writing; every block when reading.
    Both,
}

const SCAN_OUTGOING: [Direction; 2] = [Direction::Outgoing, Direction::Both];
const SCAN_INCOMING: [Direction; 2] = [Direction::Incoming, Direction::Both];
const SCAN_BOTH: [Direction; 3] = [Direction::Outgoing, Direction::Incoming, Direction::Both];

impl Direction {
    /// All directions, in block order.
    pub const ALL: [Direction; 3] = SCAN_BOTH;

    /// Blocks an iterator over this direction walks, in order.
    pub const fn scan_order(self) -> &'static [Direction] {
        match self {
            Direction::Outgoing => &SCAN_OUTGOING,
            Direction::Incoming => &SCAN_INCOMING,
            Direction::Both => &SCAN_BOTH,
        }
    }

    /// The block this direction writes to on `ids`, if allocated.
    #[inline]
    pub fn block(self, ids: &RelIdArray) -> Option<&IdBlock> {
        ids.slot(self).map(|block| &**block)
    }

    /// An iterator over `ids` configured with this direction's scan order.
    pub fn iter(self, ids: &RelIdArray) -> RelIdIter {
        RelIdIter::new(ids, self)
    }

    /// Classifies `record` relative to `node`.
    pub fn of(node: NodeId, record: &RelRecord) -> Self {
        if record.src == record.dst {
            Direction::Both
        } else if record.src == node {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }

    /// Stable one-byte tag.
    pub const fn to_u8(self) -> u8 {
        match self {
            Direction::Outgoing => 0,
            Direction::Incoming => 1,
            Direction::Both => 2,
        }
    }

    /// Short label for logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Outgoing => "out",
            Direction::Incoming => "in",
            Direction::Both => "loop",
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = RelCacheError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Direction::Outgoing),
            1 => Ok(Direction::Incoming),
            2 => Ok(Direction::Both),
            other => Err(RelCacheError::InvalidDirection(format!("tag {other}"))),
        }
    }
}

/// `Dir::Both` ("either way") maps onto the scan of every block.
impl From<Dir> for Direction {
    fn from(dir: Dir) -> Self {
        match dir {
            Dir::Out => Direction::Outgoing,
            Dir::In => Direction::Incoming,
            Dir::Both => Direction::Both,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
