//! C6 — direct-mapped, write-through cache.
//!
//! Sits above the index and lives outside the byte arena: the spec doesn't
//! place it in the arena's partition scheme, and it carries no layout
//! requirement of its own (it's rebuilt for free on restart, the arena is not).
//! Collisions are resolved by unconditional overwrite — there's no eviction
//! policy beyond "the newer tenant wins the slot".

use crate::consts::CACHE_HASH_SEED;
use crate::hash::seeded_hash;

pub struct Cache {
    cells: Vec<Option<(Vec<u8>, Vec<u8>)>>,
}

impl Cache {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "cache size must be > 0");
        Self {
            cells: vec![None; size],
        }
    }

    #[inline]
    fn slot(&self, key: &[u8]) -> usize {
        (seeded_hash(CACHE_HASH_SEED, key) as usize) % self.cells.len()
    }

    /// Returns whether `key` occupies its direct-mapped cell.
    pub fn has(&self, key: &[u8]) -> bool {
        matches!(&self.cells[self.slot(key)], Some((k, _)) if k == key)
    }

    /// Returns the cached value for `key`, or `None` if the cell is empty or
    /// holds a different key.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match &self.cells[self.slot(key)] {
            Some((k, v)) if k == key => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Unconditionally overwrites `key`'s cell, evicting any prior occupant.
    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        let idx = self.slot(key);
        self.cells[idx] = Some((key.to_vec(), value.to_vec()));
    }

    /// Clears `key`'s cell only if it currently holds `key`.
    pub fn remove(&mut self, key: &[u8]) {
        let idx = self.slot(key);
        if matches!(&self.cells[idx], Some((k, _)) if k == key) {
            self.cells[idx] = None;
        }
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}
