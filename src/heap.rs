//! C4 — record heap.
//!
//! A free-list-structured sequence of headered blocks over a byte slice (the
//! arena's heap region, `arena[INDEX_SIZE..)`). Each block is a 5-byte header
//! `(flag: u8, len: u32 big-endian)` followed by `len` bytes of payload
//! (`key || 0x00 || value`). `delete` flips the flag in place; there is no
//! coalescing, matching the spec's tolerance for fragmentation.

use byteorder::{BigEndian, ByteOrder};

use crate::consts::{FLAG_BUSY, FLAG_FREE, RECORD_HEADER_SIZE};

/// Cursor remembered across `save` calls to amortize the linear scan cost,
/// per the spec's "optionally continue from a cursor" allowance.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapCursor(pub usize);

/// Resets the heap to a single `FREE` block spanning the whole region.
pub fn clear(heap: &mut [u8]) {
    assert!(
        heap.len() >= RECORD_HEADER_SIZE,
        "heap region must hold at least one header"
    );
    write_header(heap, 0, FLAG_FREE, (heap.len() - RECORD_HEADER_SIZE) as u32);
}

#[inline]
fn read_header(heap: &[u8], offset: usize) -> (u8, usize) {
    let flag = heap[offset];
    let len = BigEndian::read_u32(&heap[offset + 1..offset + RECORD_HEADER_SIZE]) as usize;
    (flag, len)
}

#[inline]
fn write_header(heap: &mut [u8], offset: usize, flag: u8, len: u32) {
    heap[offset] = flag;
    BigEndian::write_u32(&mut heap[offset + 1..offset + RECORD_HEADER_SIZE], len);
}

/// Writes `key || 0x00 || value` into the first `FREE` block that fits,
/// splitting off a residual `FREE` block when there's room for one. Returns
/// the offset of the new record's header, or `None` if nothing fits.
///
/// Resumes scanning from `cursor` and restarts once from offset 0 if the
/// first pass (cursor..end) finds nothing, giving the cursor form a second
/// chance to find space behind it before giving up.
pub fn save(heap: &mut [u8], key: &[u8], value: &[u8], cursor: &mut HeapCursor) -> Option<usize> {
    let data_len = key.len() + 1 + value.len();

    if let Some(off) = scan_and_place(heap, data_len, cursor.0) {
        cursor.0 = off;
        write_record(heap, off, key, value);
        return Some(off);
    }
    if cursor.0 != 0 {
        if let Some(off) = scan_and_place(heap, data_len, 0) {
            cursor.0 = off;
            write_record(heap, off, key, value);
            return Some(off);
        }
    }
    None
}

/// Walks headers starting at `start`, wrapping to the region end (not past
/// it — wraparound-to-0 is handled by the caller's second pass), looking for
/// a `FREE` block of at least `data_len` bytes. On success, writes the
/// (possibly split) headers in place and returns the chosen offset; the
/// payload bytes themselves are written by the caller.
fn scan_and_place(heap: &mut [u8], data_len: usize, start: usize) -> Option<usize> {
    let mut offset = start;
    while offset + RECORD_HEADER_SIZE <= heap.len() {
        let (flag, size) = read_header(heap, offset);
        if flag == FLAG_FREE && size >= data_len {
            let residual = size - data_len;
            // A residual block needs strictly more than a header's worth of
            // space to exist with a non-zero payload; anything else is
            // folded into the busy block instead of creating a zero-size
            // FREE block.
            if residual > RECORD_HEADER_SIZE {
                write_header(heap, offset, FLAG_BUSY, data_len as u32);
                let residual_off = offset + RECORD_HEADER_SIZE + data_len;
                write_header(
                    heap,
                    residual_off,
                    FLAG_FREE,
                    (residual - RECORD_HEADER_SIZE) as u32,
                );
            } else {
                write_header(heap, offset, FLAG_BUSY, size as u32);
            }
            return Some(offset);
        }
        offset += RECORD_HEADER_SIZE + size;
    }
    None
}

fn write_record(heap: &mut [u8], offset: usize, key: &[u8], value: &[u8]) {
    let base = offset + RECORD_HEADER_SIZE;
    heap[base..base + key.len()].copy_from_slice(key);
    heap[base + key.len()] = 0x00;
    heap[base + key.len() + 1..base + key.len() + 1 + value.len()].copy_from_slice(value);
}

/// Splits a record's payload on the first `0x00` byte, returning `(key, value)`.
fn read_payload(heap: &[u8], offset: usize) -> Option<(&[u8], &[u8])> {
    let (flag, size) = read_header(heap, offset);
    if flag == FLAG_FREE {
        return None;
    }
    let payload = &heap[offset + RECORD_HEADER_SIZE..offset + RECORD_HEADER_SIZE + size];
    let split = payload.iter().position(|&b| b == 0x00)?;
    Some((&payload[..split], &payload[split + 1..]))
}

/// Returns the key stored at `offset`, or `None` if the block is free.
pub fn get_key(heap: &[u8], offset: usize) -> Option<&[u8]> {
    read_payload(heap, offset).map(|(k, _)| k)
}

/// Returns the value stored at `offset`, or `None` if the block is free.
pub fn get_value(heap: &[u8], offset: usize) -> Option<&[u8]> {
    read_payload(heap, offset).map(|(_, v)| v)
}

/// Marks the block at `offset` as free, leaving its length word (and
/// payload bytes, now garbage) untouched. Returns `false` if the block was
/// already free.
pub fn delete(heap: &mut [u8], offset: usize) -> bool {
    let (flag, size) = read_header(heap, offset);
    if flag == FLAG_FREE {
        return false;
    }
    write_header(heap, offset, FLAG_FREE, size as u32);
    true
}

/// Walks the heap from offset 0 to completion, checking the block-size
/// invariant holds (the sum of `size + header` blocks reaches exactly the
/// region end). Exposed as [`crate::store::Store::is_consistent`], an
/// on-demand diagnostic; nothing in the `load` path calls this, since a
/// restored snapshot is trusted unchecked (see [`crate::snapshot`]).
pub fn walk_is_consistent(heap: &[u8]) -> bool {
    let mut offset = 0usize;
    while offset < heap.len() {
        if offset + RECORD_HEADER_SIZE > heap.len() {
            return false;
        }
        let (_flag, size) = read_header(heap, offset);
        offset += RECORD_HEADER_SIZE + size;
    }
    offset == heap.len()
}
