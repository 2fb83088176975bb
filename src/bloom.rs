//! C3 — bloom filter.
//!
//! Five parallel hash functions over a fixed bit array, embedded directly in
//! the arena's index region (this is not the teacher's file-backed sidecar —
//! the spec keeps the filter in-memory alongside the index it guards).
//!
//! `remove` is lossy by construction: two keys can share a bit, so clearing
//! one key's bits can produce a false negative for the other. We implement it
//! as specified rather than silently dropping it (see [`crate::store`] for how
//! the facade stops trusting bloom-negatives once a delete has ever run).

use crate::consts::BLOOM_SEEDS;
use crate::hash::seeded_hash;

/// Zeroes every bit.
pub fn clear(bits: &mut [u8]) {
    bits.fill(0);
}

/// Sets the bit `key` maps to under each of the five seeds.
pub fn add(bits: &mut [u8], key: &[u8]) {
    for_each_bit(bits.len(), key, |idx| set_bit(bits, idx));
}

/// Clears the bit `key` maps to under each of the five seeds. Best-effort:
/// may also clear a bit some other live key depends on.
pub fn remove(bits: &mut [u8], key: &[u8]) {
    for_each_bit(bits.len(), key, |idx| clear_bit(bits, idx));
}

/// Returns `true` iff all five of `key`'s bits are set.
pub fn has(bits: &[u8], key: &[u8]) -> bool {
    let mut all_set = true;
    for_each_bit(bits.len(), key, |idx| {
        if !get_bit(bits, idx) {
            all_set = false;
        }
    });
    all_set
}

#[inline]
fn for_each_bit(byte_len: usize, key: &[u8], mut f: impl FnMut(usize)) {
    let nbits = byte_len * 8;
    if nbits == 0 {
        return;
    }
    for &seed in &BLOOM_SEEDS {
        let h = seeded_hash(seed, key);
        let idx = (h as usize) % nbits;
        f(idx);
    }
}

#[inline]
fn set_bit(bits: &mut [u8], idx: usize) {
    bits[idx / 8] |= 1 << (idx % 8);
}

#[inline]
fn clear_bit(bits: &mut [u8], idx: usize) {
    bits[idx / 8] &= !(1 << (idx % 8));
}

#[inline]
fn get_bit(bits: &[u8], idx: usize) -> bool {
    bits[idx / 8] & (1 << (idx % 8)) != 0
}
