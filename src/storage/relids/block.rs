//! Id blocks: fixed-capacity byte regions holding varint-encoded relationship
//! ids for one direction, plus the growth policy that replaces them when full.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::primitives::bytes::var;
use crate::types::EdgeId;

/// Default capacity of a freshly allocated block, enough for a handful of ids.
pub const DEFAULT_INITIAL_BLOCK_BYTES: usize = 20;

/// Default capacity multiplier applied when a block grows.
pub const DEFAULT_GROWTH_FACTOR: usize = 3;

/// Sizing rules for id blocks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GrowthPolicy {
    /// Capacity of a block allocated for the first id of a direction.
    pub initial_capacity: usize,
    /// Multiplier applied to the old capacity when growing.
    pub growth_factor: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_BLOCK_BYTES,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl GrowthPolicy {
    /// Capacity for a replacement of `block` that must take `needed` more bytes.
    pub fn next_capacity(&self, block: &IdBlock, needed: usize) -> usize {
        let scaled = block.capacity().saturating_mul(self.growth_factor);
        scaled.max((block.len() + needed) * 2)
    }

    /// Returns a writable block with at least `needed` free bytes.
    ///
    /// A full block is replaced by a larger copy. A block still shared with a
    /// snapshot (another array or a live iterator) is copied before it is
    /// handed out, so readers never observe the write.
    pub(crate) fn reserve<'a>(&self, block: &'a mut Arc<IdBlock>, needed: usize) -> &'a mut IdBlock {
        if needed > block.remaining() {
            let capacity = self.next_capacity(block, needed);
            trace!(
                from = block.capacity(),
                to = capacity,
                len = block.len(),
                "relids.block.grow"
            );
            *block = Arc::new(block.copy_with_capacity(capacity));
        } else if Arc::get_mut(block).is_none() {
            trace!(len = block.len(), "relids.block.unshare");
        }
        Arc::make_mut(block)
    }
}

/// A contiguous byte region with a write cursor.
///
/// Only bytes below [`IdBlock::len`] are meaningful; the remainder of the
/// capacity is scratch space for future appends.
#[derive(Clone)]
pub struct IdBlock {
    bytes: Box<[u8]>,
    len: usize,
}

impl IdBlock {
    /// Allocates an empty block of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Total bytes allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes written so far (the write cursor).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes that can still be written without growing.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len
    }

    /// Returns true when the block has no spare capacity.
    #[inline]
    pub fn is_compact(&self) -> bool {
        self.len == self.capacity()
    }

    /// The written portion of the block.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Copies the written bytes into a new block of `capacity` bytes.
    pub fn copy_with_capacity(&self, capacity: usize) -> Self {
        assert!(
            capacity >= self.len,
            "block copy would truncate: capacity {capacity}, len {}",
            self.len
        );
        let mut copy = Self::with_capacity(capacity);
        copy.extend_from_bytes(self.as_bytes());
        copy
    }

    /// Copies the written bytes into a block sized exactly to fit them.
    pub fn compacted(&self) -> Self {
        self.copy_with_capacity(self.len)
    }

    /// Encodes `id` at the write cursor.
    ///
    /// Panics if fewer than [`var::encoded_len`] bytes remain; callers reserve
    /// space through [`GrowthPolicy::reserve`] first.
    pub(crate) fn push(&mut self, id: EdgeId) {
        let written = var::encode_u64_into(id.0, &mut self.bytes[self.len..]);
        self.len += written;
    }

    /// Appends already-encoded bytes at the write cursor.
    pub(crate) fn extend_from_bytes(&mut self, src: &[u8]) {
        let end = self.len + src.len();
        self.bytes[self.len..end].copy_from_slice(src);
        self.len = end;
    }

    /// A reader over the written bytes, starting at the beginning.
    pub fn reader(&self) -> BlockReader<'_> {
        self.reader_at(0)
    }

    /// A reader over the written bytes, starting at byte offset `pos`.
    ///
    /// Offsets past the write cursor are clamped to it.
    pub fn reader_at(&self, pos: usize) -> BlockReader<'_> {
        BlockReader {
            bytes: &self.bytes,
            pos: pos.min(self.len),
            limit: self.len,
        }
    }

    /// Bytes of heap owned by this block.
    pub fn heap_size(&self) -> usize {
        self.capacity()
    }
}

impl fmt::Debug for IdBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reader = self.reader();
        write!(f, "({})", reader.clone().count())?;
        let mut sep = " ";
        while let Some(id) = reader.next_id() {
            write!(f, "{sep}{id}")?;
            sep = ",";
        }
        Ok(())
    }
}

/// An independent read view over a block: the bytes, a read position and the
/// logical limit taken when the view was created.
#[derive(Clone)]
pub struct BlockReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> BlockReader<'a> {
    /// Current read offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    /// Decodes the next id, or returns `None` at the limit.
    pub fn next_id(&mut self) -> Option<EdgeId> {
        if self.pos >= self.limit {
            return None;
        }
        let id = var::decode_u64(&self.bytes[..self.limit], &mut self.pos);
        Some(EdgeId(id))
    }
}

impl Iterator for BlockReader<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_id()
    }
}

impl fmt::Debug for BlockReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockReader")
            .field("pos", &self.pos)
            .field("remaining", &self.remaining())
            .finish()
    }
}
