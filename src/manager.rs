//! High-level convenience constructors for mapped regions.
//!
//! Thin wrappers around [`MappedRegion::open`] for the common call shapes.

use std::path::Path;

use crate::errors::Result;
use crate::region::MappedRegion;

/// Map `len` bytes of `path` starting at byte `offset`.
///
/// `len == 0` requests one page, matching [`MappedRegion::open`].
///
/// # Errors
///
/// Returns errors from `MappedRegion::open`.
pub fn open_region<P: AsRef<Path>>(path: P, offset: u64, len: u64) -> Result<MappedRegion> {
    MappedRegion::open(path, offset, len)
}

/// Map exactly one page of `path` starting at byte `offset`.
///
/// # Errors
///
/// Returns errors from `MappedRegion::open`.
pub fn open_page<P: AsRef<Path>>(path: P, offset: u64) -> Result<MappedRegion> {
    MappedRegion::open(path, offset, 0)
}
