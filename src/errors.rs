//! Crate-specific error types for devmem-io.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for devmem-io operations.
pub type Result<T> = std::result::Result<T, DevMemError>;

/// Error type covering open, mapping, bounds, and alignment failures.
#[derive(Debug, Error)]
pub enum DevMemError {
    /// Error when the backing file or device node cannot be opened read/write.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path that could not be opened.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Error when the OS mapping primitive fails. The original OS error is preserved.
    #[error("mmap of {path} failed: {source}")]
    Map {
        /// Path of the file being mapped.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Error when a requested position/width pair exceeds the user-visible length.
    #[error("access out of range: pos={pos}, size={size}, len={len}")]
    OutOfRange {
        /// Requested byte position relative to the region start.
        pos: u64,
        /// Access width in bytes.
        size: u64,
        /// User-visible length of the region.
        len: u64,
    },

    /// Error when a multi-byte access is not naturally aligned.
    #[error("misaligned access: pos={pos} requires {required}-byte alignment")]
    Misaligned {
        /// Requested byte position relative to the region start.
        pos: u64,
        /// Required alignment in bytes (the access width).
        required: u64,
    },
}
