//! Tunable constants and wire-level sentinels shared across the engine.

/// Default size of the whole arena in bytes.
pub const TOTAL_MEMORY_SIZE: usize = 0x00FF_FFFF;

/// Default byte offset splitting the arena into index region and heap.
pub const INDEX_SIZE: usize = 0x0000_FFFF;

/// Default number of cells in the direct-mapped cache.
pub const CACHE_SIZE: usize = 500;

/// "End of chain" sentinel for hash table buckets and node `next_slot` links.
pub const EOC: u32 = 0xFFFF_FFFF;

/// Record header flag: block is free.
pub const FLAG_FREE: u8 = 0;

/// Record header flag: block holds a live record.
pub const FLAG_BUSY: u8 = 1;

/// Size in bytes of a record header (1 flag byte + 4 big-endian length bytes).
pub const RECORD_HEADER_SIZE: usize = 5;

/// Size in bytes of one node-array word (hash / record_ref / next_slot are each one word).
pub const NODE_WORD_SIZE: usize = 4;

/// Number of words per node triple: (hash, record_ref, next_slot).
pub const NODE_WORDS_PER_SLOT: usize = 3;

/// Seed for the chained hash index (C5).
pub const INDEX_HASH_SEED: u32 = 199;

/// Seed for the direct-mapped cache (C6).
pub const CACHE_HASH_SEED: u32 = 731;

/// The five independent seeds used by the bloom filter (C3).
pub const BLOOM_SEEDS: [u32; 5] = [1087, 1697, 2039, 2843, 3041];

/// Default TCP listen port, overridable via the `PORT` environment variable or `--port`.
pub const DEFAULT_PORT: u16 = 17878;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
