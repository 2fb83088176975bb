//! C11 — configuration loader.
//!
//! Single place to collect tunables instead of scattering env lookups
//! through `arena`/`store`/the server binary, mirroring `QuiverConfig`'s
//! env-first, builder-overridable shape: `Config::from_env()` then
//! `.with_*` setters for programmatic overrides (CLI flags, tests).

use crate::consts::{CACHE_SIZE, DEFAULT_PORT, INDEX_SIZE, TOTAL_MEMORY_SIZE};

#[derive(Clone, Debug)]
pub struct Config {
    /// TCP listen port. Env: PORT (default 17878)
    pub port: u16,

    /// Total arena size in bytes. Env: ARENA_TOTAL_MEMORY_SIZE (default 0x00FF_FFFF)
    pub total_memory_size: usize,

    /// Index-region size in bytes, splitting the arena. Env: ARENA_INDEX_SIZE (default 0x0000_FFFF)
    pub index_size: usize,

    /// Direct-mapped cache cell count. Env: CACHE_SIZE (default 500)
    pub cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            total_memory_size: TOTAL_MEMORY_SIZE,
            index_size: INDEX_SIZE,
            cache_size: CACHE_SIZE,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PORT") {
            if let Ok(n) = v.trim().parse::<u16>() {
                cfg.port = n;
            }
        }
        if let Ok(v) = std::env::var("ARENA_TOTAL_MEMORY_SIZE") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.total_memory_size = n;
            }
        }
        if let Ok(v) = std::env::var("ARENA_INDEX_SIZE") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.index_size = n;
            }
        }
        if let Ok(v) = std::env::var("CACHE_SIZE") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.cache_size = n;
            }
        }

        cfg
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_total_memory_size(mut self, bytes: usize) -> Self {
        self.total_memory_size = bytes;
        self
    }

    pub fn with_index_size(mut self, bytes: usize) -> Self {
        self.index_size = bytes;
        self
    }

    pub fn with_cache_size(mut self, cells: usize) -> Self {
        self.cache_size = cells;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_consts() {
        let cfg = Config::default();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.total_memory_size, TOTAL_MEMORY_SIZE);
    }

    #[test]
    fn builder_overrides_stack() {
        let cfg = Config::default().with_port(9000).with_cache_size(10);
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.cache_size, 10);
        assert_eq!(cfg.total_memory_size, TOTAL_MEMORY_SIZE);
    }
}
