//! C5 — chained hash index.
//!
//! Two parallel regions over arena bytes: a hash table of bucket heads and a
//! node array of `(hash, record_ref, next_slot)` triples addressed by slot id
//! (C2 owns slot lifetime). Chains are kept in strictly descending hash order
//! so lookups can stop early once a smaller hash is seen.
//!
//! The index never reads the heap itself — it calls a caller-supplied `check`
//! predicate to confirm a hash-matching candidate's key, decoupling the
//! chain-walking logic from the heap's record encoding (see the design notes
//! on "callback predicate for key comparison").

use byteorder::{ByteOrder, LittleEndian};

use crate::bitmap;
use crate::bloom;
use crate::consts::{EOC, INDEX_HASH_SEED, NODE_WORD_SIZE};
use crate::hash::seeded_hash;

const WORD: usize = NODE_WORD_SIZE;

/// Borrowed view over one operation's worth of index state: the bucket
/// table, the node array, the slot bitmap that governs node lifetime, and
/// the bloom filter that gates negative lookups. Constructed fresh per
/// facade call from the arena's top-level split, never stored — this
/// sidesteps the self-referential-struct problem of holding long-lived
/// cross-component borrows into one shared buffer.
pub struct IndexView<'a> {
    pub table: &'a mut [u8],
    pub nodes: &'a mut [u8],
    pub bitmap: &'a mut [u8],
    pub bloom: &'a mut [u8],
}

#[inline]
fn bucket_of(table_words: usize, h: u32) -> usize {
    (h as usize) % table_words
}

#[inline]
fn read_bucket(table: &[u8], b: usize) -> u32 {
    LittleEndian::read_u32(&table[b * WORD..b * WORD + WORD])
}

#[inline]
fn write_bucket(table: &mut [u8], b: usize, slot: u32) {
    LittleEndian::write_u32(&mut table[b * WORD..b * WORD + WORD], slot);
}

/// Word offset of slot `s`'s triple: `3*s`, computed as `s + (s<<1)` per the
/// spec's explicit call-out to avoid left-to-right precedence bugs in
/// `idx + idx << 1`.
#[inline]
fn triple_word(s: u32) -> usize {
    (s as usize) + ((s as usize) << 1)
}

#[inline]
fn read_node(nodes: &[u8], s: u32) -> (u32, u32, u32) {
    let w = triple_word(s) * WORD;
    (
        LittleEndian::read_u32(&nodes[w..w + WORD]),
        LittleEndian::read_u32(&nodes[w + WORD..w + 2 * WORD]),
        LittleEndian::read_u32(&nodes[w + 2 * WORD..w + 3 * WORD]),
    )
}

#[inline]
fn write_node(nodes: &mut [u8], s: u32, hash: u32, record_ref: u32, next: u32) {
    let w = triple_word(s) * WORD;
    LittleEndian::write_u32(&mut nodes[w..w + WORD], hash);
    LittleEndian::write_u32(&mut nodes[w + WORD..w + 2 * WORD], record_ref);
    LittleEndian::write_u32(&mut nodes[w + 2 * WORD..w + 3 * WORD], next);
}

#[inline]
fn write_next(nodes: &mut [u8], s: u32, next: u32) {
    let w = triple_word(s) * WORD + 2 * WORD;
    LittleEndian::write_u32(&mut nodes[w..w + WORD], next);
}

/// Resets every bucket head to `EOC`. The bitmap and bloom are cleared by
/// their own owners (C2/C3); the facade sequences all three.
pub fn clear_table(table: &mut [u8]) {
    let words = table.len() / WORD;
    for b in 0..words {
        write_bucket(table, b, EOC);
    }
}

impl<'a> IndexView<'a> {
    fn table_words(&self) -> usize {
        self.table.len() / WORD
    }

    /// Looks up `key`, optionally consulting the bloom filter first as a
    /// fast negative, and returns the matching record reference, or `None`.
    ///
    /// `trust_bloom` lets the caller (C7) stop relying on bloom negatives
    /// once `remove` has ever run against this filter in the process
    /// lifetime -- `remove` is lossy and can manufacture false negatives for
    /// keys that share bits with a deleted one (see [`crate::bloom`]).
    pub fn get(&self, key: &[u8], trust_bloom: bool, check: impl Fn(u32) -> bool) -> Option<u32> {
        if trust_bloom && !bloom::has(self.bloom, key) {
            return None;
        }
        let h = seeded_hash(INDEX_HASH_SEED, key);
        let b = bucket_of(self.table_words(), h);
        let mut cur = read_bucket(self.table, b);
        while cur != EOC {
            let (ch, rid, next) = read_node(self.nodes, cur);
            if ch == h && check(rid) {
                return Some(rid);
            }
            if h > ch {
                return None;
            }
            cur = next;
        }
        None
    }

    /// Returns whether `key` resolves to a live record.
    pub fn has(&self, key: &[u8], trust_bloom: bool, check: impl Fn(u32) -> bool) -> bool {
        self.get(key, trust_bloom, check).is_some()
    }

    /// Inserts `(key, record_ref)`, preserving descending-hash chain order.
    /// Returns `false` (no mutation) if the bitmap is full or an exact
    /// duplicate `(hash, key)` already exists — callers decide overwrite
    /// policy (the facade always deletes first, so duplicates should not
    /// occur in normal operation; see [`crate::store`]).
    pub fn set(&mut self, record_ref: u32, key: &[u8], check: impl Fn(u32) -> bool) -> bool {
        let h = seeded_hash(INDEX_HASH_SEED, key);
        let b = bucket_of(self.table_words(), h);

        let mut prev = EOC;
        let mut cur = read_bucket(self.table, b);
        loop {
            if cur == EOC {
                let slot = match bitmap::fetch(self.bitmap) {
                    Some(s) => s,
                    None => return false,
                };
                write_node(self.nodes, slot, h, record_ref, EOC);
                if prev == EOC {
                    write_bucket(self.table, b, slot);
                } else {
                    write_next(self.nodes, prev, slot);
                }
                bloom::add(self.bloom, key);
                return true;
            }

            let (ch, rid, next) = read_node(self.nodes, cur);
            if ch == h && check(rid) {
                return false;
            }
            if h > ch {
                let slot = match bitmap::fetch(self.bitmap) {
                    Some(s) => s,
                    None => return false,
                };
                write_node(self.nodes, slot, h, record_ref, cur);
                if prev == EOC {
                    write_bucket(self.table, b, slot);
                } else {
                    write_next(self.nodes, prev, slot);
                }
                bloom::add(self.bloom, key);
                return true;
            }

            prev = cur;
            cur = next;
        }
    }

    /// Removes the node matching `key`, returning its record reference.
    /// Always marks the bloom filter's bits on an actual removal; see
    /// [`Self::get`] for the `trust_bloom` gate this feeds into.
    pub fn delete(
        &mut self,
        key: &[u8],
        trust_bloom: bool,
        check: impl Fn(u32) -> bool,
    ) -> Option<u32> {
        if trust_bloom && !bloom::has(self.bloom, key) {
            return None;
        }
        let h = seeded_hash(INDEX_HASH_SEED, key);
        let b = bucket_of(self.table_words(), h);

        let mut prev = EOC;
        let mut cur = read_bucket(self.table, b);
        while cur != EOC {
            let (ch, rid, next) = read_node(self.nodes, cur);
            if ch == h && check(rid) {
                if prev == EOC {
                    write_bucket(self.table, b, next);
                } else {
                    write_next(self.nodes, prev, next);
                }
                bitmap::free(self.bitmap, cur);
                bloom::remove(self.bloom, key);
                return Some(rid);
            }
            if h > ch {
                return None;
            }
            prev = cur;
            cur = next;
        }
        None
    }
}
