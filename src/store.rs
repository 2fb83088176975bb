//! C7 — KV facade.
//!
//! Composes the arena layout (C8), slot bitmap (C2) and bloom filter (C3)
//! via the index (C5), the record heap (C4), and the direct-mapped cache
//! (C6) into the four operations the wire protocol (C10) drives: `has`,
//! `get`, `set`, `delete`. None of these return `Result` -- not-found and
//! capacity-exhaustion are ordinary outcomes here, modeled as `bool`/
//! `Option`; a corrupted arena is not a `Result` case at all, it's an
//! assertion/bounds panic on whatever operation first touches the bad
//! bytes (see [`crate::server::handle_connection`]'s `catch_unwind`).

use log::debug;

use crate::arena::Arena;
use crate::cache::Cache;
use crate::heap::{self, HeapCursor};
use crate::index::IndexView;

pub struct Store {
    arena: Arena,
    cache: Cache,
    cursor: HeapCursor,
    /// Once any key has ever been removed, the bloom filter's lossy
    /// `remove` may have manufactured a false negative for some other live
    /// key, so lookups stop trusting bloom negatives for the rest of the
    /// process lifetime. See SPEC_FULL.md's Open Question #1 resolution.
    bloom_compromised: bool,
}

impl Store {
    pub fn new(total_memory_size: usize, index_size: usize, cache_size: usize) -> Self {
        Self {
            arena: Arena::new(total_memory_size, index_size),
            cache: Cache::new(cache_size),
            cursor: HeapCursor::default(),
            bloom_compromised: false,
        }
    }

    fn trust_bloom(&self) -> bool {
        !self.bloom_compromised
    }

    /// Looks a key's presence up without materializing its value.
    pub fn has(&mut self, key: &[u8]) -> bool {
        if self.cache.has(key) {
            return true;
        }
        self.locate(key).is_some()
    }

    /// Returns the value for `key`, checking the cache before the index.
    pub fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(v) = self.cache.get(key) {
            return Some(v.to_vec());
        }
        let offset = self.locate(key)?;
        let value = heap::get_value(self.arena.heap(), offset)?.to_vec();
        self.cache.set(key, &value);
        Some(value)
    }

    fn locate(&mut self, key: &[u8]) -> Option<usize> {
        let trust_bloom = self.trust_bloom();
        let (region, heap) = self.arena.split_for_lookup();
        let view = IndexView {
            table: region.table,
            nodes: region.nodes,
            bitmap: region.bitmap,
            bloom: region.bloom,
        };
        view.get(key, trust_bloom, |rid| heap::get_key(heap, rid as usize) == Some(key))
            .map(|rid| rid as usize)
    }

    /// Inserts or overwrites `key`. Always does delete-then-insert when the
    /// key already resolves to a live record, so `PUT` and `POST` share one
    /// core semantics and no heap block is ever leaked on overwrite (the
    /// distilled spec's Open Question #2 fix). Panics on an empty key: the
    /// wire layer is responsible for rejecting that before it reaches here.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> bool {
        assert!(!key.is_empty(), "key must not be empty");
        self.delete(key);
        let offset = match heap::save(self.arena.heap_mut(), key, value, &mut self.cursor) {
            Some(off) => off,
            None => {
                debug!("heap exhausted, refusing insert for key of {} bytes", key.len());
                return false;
            }
        };

        let region = self.arena.index_region();
        let mut view = IndexView {
            table: region.table,
            nodes: region.nodes,
            bitmap: region.bitmap,
            bloom: region.bloom,
        };
        if !view.set(offset as u32, key, |_| false) {
            debug!("index exhausted, rolling back heap block at offset {offset}");
            heap::delete(self.arena.heap_mut(), offset);
            return false;
        }
        self.cache.set(key, value);
        true
    }

    /// Removes `key`, returning whether a live record was actually removed.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.cache.remove(key);
        let trust_bloom = self.trust_bloom();
        let (region, heap) = self.arena.split_for_lookup();
        let mut view = IndexView {
            table: region.table,
            nodes: region.nodes,
            bitmap: region.bitmap,
            bloom: region.bloom,
        };
        let removed = view.delete(key, trust_bloom, |rid| heap::get_key(heap, rid as usize) == Some(key));
        match removed {
            Some(rid) => {
                self.bloom_compromised = true;
                heap::delete(self.arena.heap_mut(), rid as usize);
                true
            }
            None => false,
        }
    }

    /// Checks the heap's internal bookkeeping. A diagnostic, not a gate:
    /// `load` does not call this (see [`crate::snapshot::load`]) since the
    /// spec's contract is to copy bytes in with no validation.
    pub fn is_consistent(&self) -> bool {
        heap::walk_is_consistent(self.arena.heap())
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Drops the cache and resets in-memory bookkeeping after a snapshot
    /// `load` has overwritten the arena's raw bytes in place. Unconditional:
    /// the restored image is not checked for consistency here (or anywhere
    /// in the `load` path), matching the spec's "no validation is performed"
    /// contract for `load`.
    pub fn invalidate_after_load(&mut self) {
        self.cache.clear();
        self.cursor = HeapCursor::default();
        self.bloom_compromised = false;
    }
}
