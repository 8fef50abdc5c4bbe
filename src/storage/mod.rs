//! Relationship storage structures kept in memory while nodes are traversed.
//!
//! Holds the compact relationship id arrays, the per-node loading context that
//! grows them from storage, and their configuration and metrics.

/// Compact per-type relationship id arrays and their iterators.
pub mod relids;

mod adjacency;
mod metrics;
mod options;

/// Traversal direction used by graph queries.
pub use adjacency::Dir;

/// Metrics for relationship loading.
pub use metrics::{default_metrics, CounterMetrics, NoopMetrics, RelIdMetrics};

/// Relationship cache configuration.
pub use options::RelIdOptions;

pub use relids::{
    Direction, EdgeIdSet, NodeRelationships, RelBatch, RelIdArray, RelIdIter, RelRecord,
    RelationshipSource,
};
