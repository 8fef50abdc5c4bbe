use tracing::trace;

use crate::error::{RelCacheError, Result};
use crate::types::{EdgeId, TypeId};

use super::array::RelIdArray;
use super::direction::Direction;

const NO_SCAN: &[Direction] = &[];

/// A resumable cursor over the ids of a [`RelIdArray`].
///
/// The iterator walks the blocks of its scan order one after another and
/// remembers a byte offset per block, so a block that was partially read is
/// resumed rather than rescanned. Running out of ids only means "nothing more
/// for now": after ids were added to the owning array, call
/// [`RelIdIter::do_another_round`] with that array to pick them up. For that
/// reason the [`Iterator`] impl is not fused.
///
/// Within a round the iterator reads a snapshot of the array, so writes made
/// meanwhile never disturb a round in progress.
#[derive(Clone, Debug)]
pub struct RelIdIter {
    ids: RelIdArray,
    direction: Direction,
    scan: &'static [Direction],
    position: Option<usize>,
    cursors: [Option<usize>; 3],
    lookahead: Option<(EdgeId, Direction)>,
}

impl RelIdIter {
    pub(crate) fn new(ids: &RelIdArray, direction: Direction) -> Self {
        let scan = if ids.is_placeholder() {
            NO_SCAN
        } else {
            direction.scan_order()
        };
        let mut iter = Self {
            ids: ids.clone(),
            direction,
            scan,
            position: None,
            cursors: [None; 3],
            lookahead: None,
        };
        iter.next_block();
        iter
    }

    /// Relationship type of the underlying array.
    pub fn rel_type(&self) -> TypeId {
        self.ids.rel_type()
    }

    /// The array this iterator is currently bound to.
    pub fn ids(&self) -> &RelIdArray {
        &self.ids
    }

    /// Direction this iterator was created for.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The block the pending id came from, or the block being scanned.
    ///
    /// `None` before any block was found or once the scan ran past the last
    /// allocated block.
    pub fn current_direction(&self) -> Option<Direction> {
        match self.lookahead {
            Some((_, direction)) => Some(direction),
            None => self
                .position
                .map(|idx| self.scan[idx])
                .filter(|direction| self.ids.slot(*direction).is_some()),
        }
    }

    /// Returns true when another id is available without loading more.
    pub fn has_next(&mut self) -> bool {
        if self.lookahead.is_some() {
            return true;
        }
        loop {
            if let Some(next) = self.decode_current() {
                self.lookahead = Some(next);
                return true;
            }
            if !self.next_block() {
                return false;
            }
        }
    }

    /// Consumes the next id.
    pub fn next_id(&mut self) -> Result<EdgeId> {
        self.next_with_direction()
            .map(|(id, _)| id)
            .ok_or(RelCacheError::Exhausted)
    }

    /// Consumes the next id along with the block it came from.
    pub fn next_with_direction(&mut self) -> Option<(EdgeId, Direction)> {
        if !self.has_next() {
            return None;
        }
        self.lookahead.take()
    }

    /// Restarts the walk over the scan order against `ids`, the current state
    /// of the array this iterator reads.
    ///
    /// Offsets already read are kept and every block limit is taken from
    /// `ids`, so ids appended since the last round become visible, as do
    /// blocks allocated since then. `ids` may also be a replacement of the
    /// original array (grown, merged, upgraded or shrunk).
    pub fn do_another_round(&mut self, ids: &RelIdArray) {
        if self.ids.is_placeholder() || ids.is_placeholder() {
            *self = self.direction.iter(ids);
            return;
        }
        self.rebind(ids);
        self.position = None;
        self.next_block();
    }

    /// Rebinds the iterator to `source`, typically the array that replaced the
    /// one this iterator was created over, without restarting the round.
    ///
    /// Every block already visited is resumed at the same byte offset in the
    /// corresponding block of `source`, which is only meaningful when `source`
    /// extends the old blocks (growth, merge, upgrade, shrink). After ids were
    /// removed, create a fresh iterator instead.
    pub fn update_source(&mut self, source: &RelIdArray, direction: Direction) {
        if self.ids.is_placeholder() || source.is_placeholder() {
            *self = direction.iter(source);
            return;
        }
        self.rebind(source);
    }

    fn rebind(&mut self, source: &RelIdArray) {
        // Writes through a shared block always replace it, so an unchanged
        // handle means unchanged blocks.
        if self.ids.same_instance(source) {
            return;
        }
        self.ids = source.clone();
        let ids = &self.ids;
        for (cursor, scanned) in self.cursors.iter_mut().zip(self.scan) {
            if let Some(pos) = *cursor {
                *cursor = ids.slot(*scanned).map(|block| pos.min(block.len()));
            }
        }
        trace!(ty = self.ids.rel_type().0, "relids.iter.rebind");
    }

    fn decode_current(&mut self) -> Option<(EdgeId, Direction)> {
        let idx = self.position?;
        let pos = self.cursors[idx]?;
        let direction = self.scan[idx];
        let block = self.ids.slot(direction)?;
        let mut reader = block.reader_at(pos);
        let id = reader.next_id()?;
        self.cursors[idx] = Some(reader.position());
        Some((id, direction))
    }

    fn next_block(&mut self) -> bool {
        let mut next = self.position.map_or(0, |idx| idx + 1);
        while next < self.scan.len() {
            self.position = Some(next);
            if self.cursors[next].is_some() {
                return true;
            }
            if self.ids.slot(self.scan[next]).is_some() {
                self.cursors[next] = Some(0);
                return true;
            }
            next += 1;
        }
        false
    }
}

impl Iterator for RelIdIter {
    type Item = EdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with_direction().map(|(id, _)| id)
    }
}
