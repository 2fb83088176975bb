//! C9 — snapshot interface.
//!
//! `save`/`load` move the arena's raw backing bytes to and from a file as
//! an opaque image: no checksums, no version header, no write-ahead log.
//! That's a deliberate match to the spec's non-goals around durability --
//! this crate gives you a point-in-time memory dump, not a database that
//! survives a crash mid-write.
//!
//! `load` performs no validation of the image it reads: the bytes are
//! copied straight into the arena, truncated or zero-padded to the arena's
//! exact size. An internally inconsistent image is the caller's problem,
//! not this module's -- it surfaces later, if at all, as a panic on
//! whatever operation first walks the bad bytes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::store::Store;

/// Writes the arena's current bytes to `path`, overwriting any existing file.
pub fn save(store: &Store, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, store.arena().raw())
        .with_context(|| format!("writing snapshot to {}", path.display()))?;
    info!("snapshot saved to {} ({} bytes)", path.display(), store.arena().raw().len());
    Ok(())
}

/// Reads `path` and copies its bytes into the arena in place, truncated or
/// zero-padded to the arena's exact size if the file doesn't match it
/// exactly. No validation of the image's internal structure is performed;
/// a `load` is a warm restart of the process's view of the arena, nothing
/// more.
pub fn load(store: &mut Store, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("reading snapshot from {}", path.display()))?;
    store.arena_mut().load_raw(&bytes);
    store.invalidate_after_load();
    debug!("snapshot loaded from {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests;
