use std::collections::HashSet;
use std::fmt;
use std::hash::BuildHasher;
use std::mem;
use std::sync::Arc;

use tracing::debug;

use crate::error::{RelCacheError, Result};
use crate::primitives::bytes::var::MAX_VARINT_LEN;
use crate::types::{EdgeId, TypeId};

use super::block::{GrowthPolicy, IdBlock};
use super::direction::Direction;
use super::iter::RelIdIter;

/// One direction's block; `None` until the first id of that direction lands.
pub(crate) type Slot = Option<Arc<IdBlock>>;

#[derive(Clone)]
enum Variant {
    /// Immutable placeholder for "no relationships of this type".
    Empty,
    /// Outgoing and incoming blocks only.
    Plain,
    /// Outgoing, incoming and loop blocks.
    WithLoops(Slot),
}

/// The relationship ids of one type for one node, packed per direction.
///
/// Blocks are shared by `Arc` and copied on write, so cloning an array is
/// cheap and a clone (such as the one held by a [`RelIdIter`]) keeps seeing
/// the bytes it was created over. Operations that change the variant or
/// rebuild blocks consume `self` and return the array to use from then on.
#[derive(Clone)]
pub struct RelIdArray {
    ty: TypeId,
    policy: GrowthPolicy,
    out: Slot,
    inc: Slot,
    variant: Variant,
}

impl RelIdArray {
    /// Creates an empty array that cannot hold loops.
    pub fn new(ty: TypeId) -> Self {
        Self::with_policy(ty, GrowthPolicy::default())
    }

    /// Creates an empty array that cannot hold loops, sized by `policy`.
    pub fn with_policy(ty: TypeId, policy: GrowthPolicy) -> Self {
        Self {
            ty,
            policy,
            out: None,
            inc: None,
            variant: Variant::Plain,
        }
    }

    /// Creates an empty array that can hold loops.
    pub fn with_loops(ty: TypeId) -> Self {
        Self::new(ty).into_loop_capable()
    }

    /// The immutable placeholder for a node without relationships of `ty`.
    pub fn empty(ty: TypeId) -> Self {
        Self {
            ty,
            policy: GrowthPolicy::default(),
            out: None,
            inc: None,
            variant: Variant::Empty,
        }
    }

    /// Relationship type shared by every id in the array.
    #[inline]
    pub fn rel_type(&self) -> TypeId {
        self.ty
    }

    /// Block sizing rules used by this array.
    #[inline]
    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Returns true for the [`RelIdArray::empty`] placeholder.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.variant, Variant::Empty)
    }

    /// Returns true when the array has a loop slot.
    #[inline]
    pub fn is_loop_capable(&self) -> bool {
        matches!(self.variant, Variant::WithLoops(_))
    }

    /// Returns true when a loop block is allocated.
    #[inline]
    pub fn has_loops(&self) -> bool {
        self.loop_slot().is_some()
    }

    /// Returns true when no block is allocated.
    pub fn is_empty(&self) -> bool {
        self.out.is_none() && self.inc.is_none() && !self.has_loops()
    }

    fn loop_slot(&self) -> Option<&Arc<IdBlock>> {
        match &self.variant {
            Variant::WithLoops(slot) => slot.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn slot(&self, direction: Direction) -> Option<&Arc<IdBlock>> {
        match direction {
            Direction::Outgoing => self.out.as_ref(),
            Direction::Incoming => self.inc.as_ref(),
            Direction::Both => self.loop_slot(),
        }
    }

    fn slot_mut(&mut self, direction: Direction) -> Result<&mut Slot> {
        match (&mut self.variant, direction) {
            (Variant::Empty, _) => Err(RelCacheError::Unsupported(
                "the empty relationship id array is immutable",
            )),
            (_, Direction::Outgoing) => Ok(&mut self.out),
            (_, Direction::Incoming) => Ok(&mut self.inc),
            (Variant::WithLoops(slot), Direction::Both) => Ok(slot),
            (Variant::Plain, Direction::Both) => Err(RelCacheError::Unsupported(
                "loop ids need a loop-capable array",
            )),
        }
    }

    /// Allocated blocks in block order.
    pub fn blocks(&self) -> impl Iterator<Item = (Direction, &IdBlock)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.slot(direction).map(|block| (direction, &**block)))
    }

    /// Appends `id` to the block `direction` writes to.
    ///
    /// `Direction::Both` records a loop and fails on arrays that are not
    /// loop-capable. Nothing is modified when this fails.
    pub fn add(&mut self, id: EdgeId, direction: Direction) -> Result<()> {
        let policy = self.policy;
        let slot = self.slot_mut(direction)?;
        let block =
            slot.get_or_insert_with(|| Arc::new(IdBlock::with_capacity(policy.initial_capacity)));
        policy.reserve(block, MAX_VARINT_LEN).push(id);
        Ok(())
    }

    /// Appends every block of `source` to the matching block of `self`,
    /// copying encoded bytes without decoding them.
    ///
    /// Upgrades to a loop-capable array first when `source` carries loops.
    pub fn add_all(self, source: &RelIdArray) -> RelIdArray {
        let mut merged = self.upgrade_if_needed(source);
        if merged.is_placeholder() {
            merged.variant = Variant::Plain;
        }
        for direction in Direction::ALL {
            merged.append(source, direction);
        }
        merged
    }

    fn append(&mut self, source: &RelIdArray, direction: Direction) {
        let Some(from) = source.slot(direction) else {
            return;
        };
        let policy = self.policy;
        let slot = match self.slot_mut(direction) {
            Ok(slot) => slot,
            Err(_) => unreachable!("add_all upgrades before appending loop ids"),
        };
        if let Some(block) = slot.as_mut() {
            policy
                .reserve(block, from.len())
                .extend_from_bytes(from.as_bytes());
        } else {
            *slot = Some(Arc::clone(from));
        }
    }

    /// Drops every id in `excluded`, rebuilding each block compactly.
    ///
    /// Returns the number of ids dropped. Surviving ids keep their order.
    pub fn remove_all<S: BuildHasher>(&mut self, excluded: &HashSet<EdgeId, S>) -> usize {
        let ty = self.ty;
        let mut removed = 0usize;
        for direction in Direction::ALL {
            let Ok(slot) = self.slot_mut(direction) else {
                continue;
            };
            let Some(block) = slot.as_mut() else {
                continue;
            };
            let mut kept = IdBlock::with_capacity(block.len());
            for id in block.reader() {
                if excluded.contains(&id) {
                    removed += 1;
                } else {
                    kept.push(id);
                }
            }
            if !kept.is_compact() {
                kept = kept.compacted();
            }
            *block = Arc::new(kept);
        }
        debug!(ty = ty.0, removed, excluded = excluded.len(), "relids.remove_all");
        removed
    }

    /// Returns the array with every block trimmed to its written length.
    ///
    /// When nothing needs trimming the same blocks come back untouched.
    pub fn shrink(mut self) -> RelIdArray {
        if self.blocks().all(|(_, block)| block.is_compact()) {
            return self;
        }
        let mut reclaimed = 0usize;
        for direction in Direction::ALL {
            let Ok(Some(block)) = self.slot_mut(direction) else {
                continue;
            };
            if !block.is_compact() {
                reclaimed += block.remaining();
                *block = Arc::new(block.compacted());
            }
        }
        debug!(ty = self.ty.0, reclaimed, "relids.shrink");
        self
    }

    /// A new, empty array of the same type and variant.
    ///
    /// The placeholder yields a plain array.
    pub fn new_similar_instance(&self) -> RelIdArray {
        let variant = match self.variant {
            Variant::WithLoops(_) => Variant::WithLoops(None),
            _ => Variant::Plain,
        };
        Self {
            ty: self.ty,
            policy: self.policy,
            out: None,
            inc: None,
            variant,
        }
    }

    /// Upgrades to a loop-capable array when `template` carries loops.
    pub fn upgrade_if_needed(self, template: &RelIdArray) -> RelIdArray {
        if template.has_loops() {
            self.into_loop_capable()
        } else {
            self
        }
    }

    /// Returns a loop-capable array sharing this array's blocks.
    pub fn into_loop_capable(self) -> RelIdArray {
        if self.is_loop_capable() {
            return self;
        }
        debug!(ty = self.ty.0, "relids.upgrade");
        Self {
            variant: Variant::WithLoops(None),
            ..self
        }
    }

    /// Drops the loop slot when it holds nothing.
    pub fn downgrade_if_possible(self) -> RelIdArray {
        let loops_unused = match &self.variant {
            Variant::WithLoops(slot) => slot.as_ref().map_or(true, |block| block.is_empty()),
            _ => false,
        };
        if !loops_unused {
            return self;
        }
        debug!(ty = self.ty.0, "relids.downgrade");
        Self {
            variant: Variant::Plain,
            ..self
        }
    }

    /// Whether an iterator over another instance may need rebinding to this
    /// one. The placeholder never changes, so it answers false.
    pub fn could_be_needing_update(&self) -> bool {
        !self.is_placeholder()
    }

    /// Returns true when `other` is the same variant over the same blocks.
    pub fn same_instance(&self, other: &RelIdArray) -> bool {
        fn same_block(a: Option<&Arc<IdBlock>>, b: Option<&Arc<IdBlock>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
        }
        self.ty == other.ty
            && mem::discriminant(&self.variant) == mem::discriminant(&other.variant)
            && Direction::ALL
                .into_iter()
                .all(|direction| same_block(self.slot(direction), other.slot(direction)))
    }

    /// An iterator over the ids `direction` scans.
    pub fn iter(&self, direction: Direction) -> RelIdIter {
        direction.iter(self)
    }

    /// Bytes of memory held by the array, counting shared blocks in full.
    pub fn heap_size(&self) -> usize {
        mem::size_of::<Self>()
            + self
                .blocks()
                .map(|(_, block)| mem::size_of::<IdBlock>() + block.heap_size())
                .sum::<usize>()
    }
}

impl fmt::Debug for RelIdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.variant {
            Variant::Empty => "EmptyRelIdArray",
            Variant::Plain => "RelIdArray",
            Variant::WithLoops(_) => "RelIdArrayWithLoops",
        };
        write!(f, "{kind}[type:{}]", self.ty)?;
        for (direction, block) in self.blocks() {
            write!(f, " {direction}:{block:?}")?;
        }
        Ok(())
    }
}
