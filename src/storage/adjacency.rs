use std::fmt;
use std::str::FromStr;

use crate::error::RelCacheError;

/// Traversal direction as requested by graph queries.
///
/// `Both` means "either way": outgoing, incoming and loop relationships.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Dir {
    /// Follow relationships leaving the node.
    Out,
    /// Follow relationships entering the node.
    In,
    /// Follow relationships in either direction.
    Both,
}

impl Dir {
    /// Returns true when outgoing relationships are included.
    pub fn includes_out(self) -> bool {
        matches!(self, Dir::Out | Dir::Both)
    }

    /// Returns true when incoming relationships are included.
    pub fn includes_in(self) -> bool {
        matches!(self, Dir::In | Dir::Both)
    }
}

impl FromStr for Dir {
    type Err = RelCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "out" | "outgoing" => Ok(Dir::Out),
            "in" | "incoming" => Ok(Dir::In),
            "both" => Ok(Dir::Both),
            _ => Err(RelCacheError::InvalidDirection(s.to_owned())),
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dir::Out => f.write_str("out"),
            Dir::In => f.write_str("in"),
            Dir::Both => f.write_str("both"),
        }
    }
}
