use std::collections::HashSet;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::Result;
use crate::types::EdgeId;

use super::array::RelIdArray;
use super::direction::Direction;

impl RelIdArray {
    /// Combines a cached array, freshly loaded ids and ids known to be stale
    /// into the array to cache next.
    ///
    /// - Without `remove`, `add` is appended to `src` byte-wise and the result
    ///   drops an unused loop slot.
    /// - With `remove`, `src` is copied with the stale ids filtered out, then
    ///   every id of `add` not in `remove` is appended under its original
    ///   direction. Stale ids never reach the result.
    ///
    /// Returns `None` only when both `src` and `add` are absent.
    pub fn reconcile<S: BuildHasher>(
        src: Option<RelIdArray>,
        add: Option<RelIdArray>,
        remove: Option<&HashSet<EdgeId, S>>,
    ) -> Result<Option<RelIdArray>> {
        let Some(remove) = remove else {
            return Ok(match (src, add) {
                (None, add) => add.map(RelIdArray::downgrade_if_possible),
                (Some(src), Some(add)) => Some(src.add_all(&add).downgrade_if_possible()),
                (Some(src), None) => Some(src),
            });
        };

        let mut merged = match (&src, &add) {
            (None, None) => return Ok(None),
            (Some(src), _) => {
                let mut copy = src.new_similar_instance().add_all(src);
                copy.remove_all(remove);
                copy
            }
            (None, Some(add)) => add.new_similar_instance(),
        };

        let mut appended = 0usize;
        let mut skipped = 0usize;
        if let Some(add) = &add {
            merged = merged.upgrade_if_needed(add);
            let mut fresh = add.iter(Direction::Both);
            while let Some((id, direction)) = fresh.next_with_direction() {
                if remove.contains(&id) {
                    skipped += 1;
                } else {
                    merged.add(id, direction)?;
                    appended += 1;
                }
            }
        }
        debug!(
            ty = merged.rel_type().0,
            appended,
            skipped,
            excluded = remove.len(),
            "relids.reconcile"
        );
        Ok(Some(merged))
    }
}
