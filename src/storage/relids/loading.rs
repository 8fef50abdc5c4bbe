//! Lazy, batch-wise loading of a node's relationship ids.

use std::mem;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::Result;
use crate::storage::adjacency::Dir;
use crate::storage::metrics::{default_metrics, RelIdMetrics};
use crate::storage::options::RelIdOptions;
use crate::types::{EdgeId, NodeId, TypeId};

use super::array::RelIdArray;
use super::block::GrowthPolicy;
use super::direction::Direction;
use super::iter::RelIdIter;

/// A relationship record as read from storage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RelRecord {
    /// Relationship id.
    pub id: EdgeId,
    /// Relationship type.
    pub ty: TypeId,
    /// Start node.
    pub src: NodeId,
    /// End node.
    pub dst: NodeId,
}

/// The ids one load round delivers for a node.
#[derive(Debug, Default)]
pub struct RelBatch {
    /// Newly fetched ids, per relationship type.
    pub added: FxHashMap<TypeId, RelIdArray>,
    /// Ids that turned stale since earlier rounds, if any.
    pub removed: Option<FxHashSet<EdgeId>>,
    policy: GrowthPolicy,
}

impl RelBatch {
    /// Creates an empty batch using the default growth policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty batch whose arrays are sized by `policy`.
    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Adds `id` of type `ty` in `direction`, upgrading the type's array on
    /// its first loop.
    pub fn push(&mut self, ty: TypeId, id: EdgeId, direction: Direction) -> Result<()> {
        let policy = self.policy;
        let ids = self
            .added
            .entry(ty)
            .or_insert_with(|| RelIdArray::with_policy(ty, policy));
        if direction == Direction::Both && !ids.is_loop_capable() {
            let plain = mem::replace(ids, RelIdArray::empty(ty));
            *ids = plain.into_loop_capable();
        }
        ids.add(id, direction)
    }

    /// Adds `record`, classified relative to `node`.
    pub fn push_record(&mut self, node: NodeId, record: &RelRecord) -> Result<()> {
        self.push(record.ty, record.id, Direction::of(node, record))
    }

    /// Marks `id` as stale.
    pub fn exclude(&mut self, id: EdgeId) {
        self.removed.get_or_insert_with(FxHashSet::default).insert(id);
    }

    /// Number of ids added across all types.
    pub fn id_count(&self) -> usize {
        self.added
            .values()
            .map(|ids| ids.iter(Direction::Both).count())
            .sum()
    }

    /// Returns true when the batch neither adds nor excludes anything.
    pub fn is_empty(&self) -> bool {
        self.added.values().all(RelIdArray::is_empty)
            && self.removed.as_ref().map_or(true, |removed| removed.is_empty())
    }
}

/// Supplies a node's relationships one batch at a time.
pub trait RelationshipSource {
    /// Fills `batch` with the next page of `node`'s relationships.
    ///
    /// Returns `false`, leaving `batch` untouched, once every relationship
    /// has been delivered.
    fn load_batch(&mut self, node: NodeId, batch: &mut RelBatch) -> Result<bool>;
}

/// The relationship ids cached for one node, grown lazily from a
/// [`RelationshipSource`].
pub struct NodeRelationships<S> {
    node: NodeId,
    source: S,
    options: RelIdOptions,
    metrics: Arc<dyn RelIdMetrics>,
    arrays: FxHashMap<TypeId, RelIdArray>,
    fully_loaded: bool,
    exclusion_rounds: u64,
}

impl<S: RelationshipSource> NodeRelationships<S> {
    /// Creates an empty cache for `node` with default options.
    pub fn new(node: NodeId, source: S) -> Self {
        Self::with_options(node, source, RelIdOptions::default())
    }

    /// Creates an empty cache for `node`.
    pub fn with_options(node: NodeId, source: S, options: RelIdOptions) -> Self {
        Self {
            node,
            source,
            options,
            metrics: default_metrics(),
            arrays: FxHashMap::default(),
            fully_loaded: false,
            exclusion_rounds: 0,
        }
    }

    /// Sets the metrics sink.
    pub fn metrics(mut self, metrics: Arc<dyn RelIdMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The node whose relationships are cached.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns true once the source reported that nothing is left.
    pub fn fully_loaded(&self) -> bool {
        self.fully_loaded
    }

    /// Relationship types seen so far, in ascending order.
    pub fn types(&self) -> Vec<TypeId> {
        let mut types: Vec<TypeId> = self.arrays.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// The cached array for `ty`, if any id of that type was loaded.
    pub fn ids(&self, ty: TypeId) -> Option<&RelIdArray> {
        self.arrays.get(&ty)
    }

    /// Bytes of memory held by the cached arrays.
    pub fn heap_size(&self) -> usize {
        self.arrays.values().map(RelIdArray::heap_size).sum()
    }

    /// Pulls one more batch from the source and folds it into the cache.
    ///
    /// Returns `false` once the source is exhausted.
    pub fn load_more(&mut self) -> Result<bool> {
        if self.fully_loaded {
            return Ok(false);
        }
        let mut batch = RelBatch::with_policy(self.options.growth_policy());
        if !self.source.load_batch(self.node, &mut batch)? {
            self.fully_loaded = true;
            debug!(node = self.node.0, "relids.load.done");
            return Ok(false);
        }
        let ids_added = batch.id_count();
        let RelBatch {
            mut added, removed, ..
        } = batch;

        let mut types: Vec<TypeId> = added.keys().copied().collect();
        if removed.is_some() {
            types.extend(
                self.arrays
                    .keys()
                    .copied()
                    .filter(|ty| !added.contains_key(ty)),
            );
        }

        // Every type is reconciled before any is committed, so a failing
        // round leaves the cache as it was.
        let mut reconciled = Vec::with_capacity(types.len());
        for &ty in &types {
            let src = self.arrays.get(&ty).cloned();
            let upgradable = src.as_ref().is_some_and(|ids| !ids.is_loop_capable());
            if let Some(ids) = RelIdArray::reconcile(src, added.remove(&ty), removed.as_ref())? {
                reconciled.push((ty, upgradable, ids));
            }
        }

        for (ty, upgradable, mut ids) in reconciled {
            if upgradable && ids.is_loop_capable() {
                self.metrics.array_upgraded();
            }
            if self.options.shrink_after_load {
                let before = ids.heap_size();
                ids = ids.shrink();
                let after = ids.heap_size();
                if after < before {
                    self.metrics.array_shrunk(before - after);
                }
            }
            self.arrays.insert(ty, ids);
        }
        if removed.is_some() {
            self.exclusion_rounds += 1;
        }

        let ids_excluded = removed.as_ref().map_or(0, |removed| removed.len());
        self.metrics
            .load_round(types.len(), ids_added, ids_excluded);
        debug!(
            node = self.node.0,
            types = types.len(),
            ids_added,
            ids_excluded,
            "relids.load.round"
        );
        Ok(true)
    }

    /// An iterator over the cached ids of `ty` in `dir`.
    pub fn iter(&self, ty: TypeId, dir: Dir) -> RelIdIter {
        let direction = Direction::from(dir);
        match self.arrays.get(&ty) {
            Some(ids) => ids.iter(direction),
            None => RelIdArray::empty(ty).iter(direction),
        }
    }

    /// Starts another round of `iter` over the current array of its type,
    /// making ids loaded since it ran dry visible.
    pub fn refresh(&self, iter: &mut RelIdIter) {
        let Some(ids) = self.arrays.get(&iter.rel_type()) else {
            return;
        };
        if !iter.ids().is_placeholder() && !iter.ids().same_instance(ids) {
            self.metrics.iterator_rebound();
        }
        iter.do_another_round(ids);
    }

    /// Collects every relationship id of `types` (all types when empty) in
    /// `dir`, loading batches until the source is exhausted.
    ///
    /// Ids are produced round by round through live iterators. A round that
    /// carried stale ids compacts the arrays, so the walk restarts over the
    /// reconciled arrays and stale ids never appear in the result.
    pub fn relationships(&mut self, dir: Dir, types: &[TypeId]) -> Result<Vec<EdgeId>> {
        let mut iters: FxHashMap<TypeId, RelIdIter> = FxHashMap::default();
        let mut out = Vec::new();
        let mut epoch = self.exclusion_rounds;
        loop {
            if epoch != self.exclusion_rounds {
                iters.clear();
                out.clear();
                epoch = self.exclusion_rounds;
            }
            let wanted = if types.is_empty() {
                self.types()
            } else {
                types.to_vec()
            };
            for ty in wanted {
                if !self.arrays.contains_key(&ty) {
                    continue;
                }
                let iter = iters.entry(ty).or_insert_with(|| self.iter(ty, dir));
                self.refresh(iter);
                out.extend(iter.by_ref());
            }
            if !self.load_more()? {
                break;
            }
        }
        Ok(out)
    }
}
