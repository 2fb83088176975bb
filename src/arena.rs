//! C8 — arena layout manager.
//!
//! Owns the single pre-allocated `Vec<u8>` and carves it into the four
//! index-region slices (bitmap, bloom, hash table, node array) plus the
//! heap, per the sub-layout formulas: given `L = INDEX_SIZE >> 3`,
//! `nodes_len = (L>>1)+(L>>2)` words, `bitmap_len = nodes_len>>5` bytes,
//! `bloom_len = L>>5` bytes, `htable_len = L - nodes_len - bitmap_len -
//! bloom_len` words. Regions sit in the arena in that order: bitmap, bloom,
//! hash table, node array, then the heap fills the rest.
//!
//! Slices are handed out fresh per call via `split_at_mut`, never stored
//! across calls, so two disjoint regions (e.g. the index region mutably and
//! the heap immutably) can be borrowed at once without self-referential
//! struct tricks -- mirroring the teacher's page-at-a-time buffer access.

use crate::consts::NODE_WORD_SIZE;

pub struct Arena {
    buf: Vec<u8>,
    index_size: usize,
    bitmap_len: usize,
    bloom_len: usize,
    htable_len: usize,
    nodes_len: usize,
}

/// Layout geometry derived from `index_size`, all in the units the regions
/// are addressed in (bitmap/bloom in bytes, hash table/node array in words).
pub struct Layout {
    pub bitmap_len: usize,
    pub bloom_len: usize,
    pub htable_len: usize,
    pub nodes_len: usize,
}

impl Layout {
    pub fn compute(index_size: usize) -> Self {
        let l = index_size >> 3;
        let nodes_len = (l >> 1) + (l >> 2);
        let bitmap_len = nodes_len >> 5;
        let bloom_len = l >> 5;
        let htable_len = l
            .checked_sub(nodes_len)
            .and_then(|v| v.checked_sub(bitmap_len))
            .and_then(|v| v.checked_sub(bloom_len))
            .expect("index_size too small to hold bitmap/bloom/table/nodes");

        assert!(
            bitmap_len * 8 * 3 <= nodes_len,
            "node array (words={nodes_len}) cannot address every slot the bitmap \
             (capacity={}) can name",
            bitmap_len * 8
        );

        Layout {
            bitmap_len,
            bloom_len,
            htable_len,
            nodes_len,
        }
    }

    fn index_bytes(&self) -> usize {
        self.bitmap_len + self.bloom_len + (self.htable_len + self.nodes_len) * NODE_WORD_SIZE
    }
}

/// A single pass's worth of mutably borrowed index-region slices.
pub struct IndexRegion<'a> {
    pub bitmap: &'a mut [u8],
    pub bloom: &'a mut [u8],
    pub table: &'a mut [u8],
    pub nodes: &'a mut [u8],
}

impl Arena {
    /// Allocates a zeroed arena and initializes it to the all-empty state:
    /// every bucket `EOC`, slot bitmap clear, bloom clear, heap a single
    /// free block spanning the whole heap region.
    pub fn new(total_memory_size: usize, index_size: usize) -> Self {
        let layout = Layout::compute(index_size);
        assert!(
            layout.index_bytes() <= index_size,
            "computed index region ({} bytes) exceeds index_size ({index_size})",
            layout.index_bytes()
        );
        assert!(
            total_memory_size > index_size,
            "total_memory_size must leave room for a non-empty heap"
        );

        let mut arena = Self {
            buf: vec![0u8; total_memory_size],
            index_size,
            bitmap_len: layout.bitmap_len,
            bloom_len: layout.bloom_len,
            htable_len: layout.htable_len,
            nodes_len: layout.nodes_len,
        };
        arena.reset();
        arena
    }

    /// Reinitializes every region to its empty state in place, without
    /// reallocating. Used by startup and by a from-scratch rebuild.
    pub fn reset(&mut self) {
        let region = self.index_region();
        crate::bitmap::clear(region.bitmap);
        crate::bloom::clear(region.bloom);
        crate::index::clear_table(region.table);
        crate::heap::clear(self.heap_mut());
    }

    fn bloom_start(&self) -> usize {
        self.bitmap_len
    }
    fn table_start(&self) -> usize {
        self.bloom_start() + self.bloom_len
    }
    fn table_bytes(&self) -> usize {
        self.htable_len * NODE_WORD_SIZE
    }
    fn nodes_bytes(&self) -> usize {
        self.nodes_len * NODE_WORD_SIZE
    }

    /// Splits the arena into the four index-region slices, borrowed mutably.
    pub fn index_region(&mut self) -> IndexRegion<'_> {
        let table_start = self.table_start();
        let bitmap_len = self.bitmap_len;
        let table_bytes = self.table_bytes();
        let nodes_bytes = self.nodes_bytes();
        let (bitmap_bloom, rest) = self.buf.split_at_mut(table_start);
        let (bitmap, bloom) = bitmap_bloom.split_at_mut(bitmap_len);
        let (table, nodes) = rest.split_at_mut(table_bytes);
        let nodes = &mut nodes[..nodes_bytes];
        IndexRegion {
            bitmap,
            bloom,
            table,
            nodes,
        }
    }

    /// Splits the arena into the mutable index region and the heap,
    /// borrowed immutably, in one pass -- lets a caller walk an index chain
    /// and read heap payloads to confirm a key match without ever holding
    /// two mutable views into the same backing buffer.
    pub fn split_for_lookup(&mut self) -> (IndexRegion<'_>, &[u8]) {
        let index_size = self.index_size;
        let bloom_end = self.bloom_start() + self.bloom_len;
        let bitmap_len = self.bitmap_len;
        let table_bytes = self.table_bytes();
        let nodes_bytes = self.nodes_bytes();
        let (index_bytes, heap) = self.buf.split_at_mut(index_size);
        let (bitmap_bloom, rest) = index_bytes.split_at_mut(bloom_end);
        let (bitmap, bloom) = bitmap_bloom.split_at_mut(bitmap_len);
        let (table, nodes) = rest.split_at_mut(table_bytes);
        let nodes = &mut nodes[..nodes_bytes];
        (
            IndexRegion {
                bitmap,
                bloom,
                table,
                nodes,
            },
            &*heap,
        )
    }

    /// The heap region: everything from `index_size` to the end of the arena.
    pub fn heap_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.index_size..]
    }

    pub fn heap(&self) -> &[u8] {
        &self.buf[self.index_size..]
    }

    /// Raw backing bytes, for snapshotting (C9) and restore.
    pub fn raw(&self) -> &[u8] {
        &self.buf
    }

    pub fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Copies `bytes` over the arena's backing storage, truncating if
    /// `bytes` is longer than the arena and zero-filling any remainder if
    /// it's shorter. No attempt is made to validate the image's internal
    /// layout -- a restored image is trusted the same way a freshly
    /// allocated arena is.
    pub fn load_raw(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(self.buf.len());
        self.buf[..n].copy_from_slice(&bytes[..n]);
        for b in &mut self.buf[n..] {
            *b = 0;
        }
    }

    pub fn total_memory_size(&self) -> usize {
        self.buf.len()
    }

    pub fn index_size(&self) -> usize {
        self.index_size
    }
}
