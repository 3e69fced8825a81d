//! # devmem-io: page-aligned mapped access to device regions
//!
//! This crate maps a byte region of a file — typically a physical-memory or
//! MMIO device node such as `/dev/mem` — and exposes bounds-checked, volatile
//! typed reads and writes at byte positions within that region.
//!
//! ## Features
//!
//! - **Page-alignment handled for you**: request any `(offset, length)`; the
//!   crate widens it to the page-aligned span the OS mapping primitive
//!   requires and rebases accesses internally
//! - **Volatile access**: every load and store is a single volatile operation,
//!   never elided, reordered, or widened — safe against live device registers
//! - **Bounds-checked**: accesses are validated against the requested length,
//!   not the wider mapping
//! - **RAII teardown**: the mapping is released exactly once, when the region
//!   is dropped or explicitly closed
//!
//! ## Quick Start
//!
//! ```no_run
//! use devmem_io::MappedRegion;
//!
//! // Map 50 bytes at byte offset 100 of the device
//! let mut region = MappedRegion::open("/dev/mem", 100, 50)?;
//!
//! region.write_u32(0, 0xDEAD_BEEF)?;
//! assert_eq!(region.read_u32(0)?, 0xDEAD_BEEF);
//!
//! println!("{}", region.describe());
//! # Ok::<(), devmem_io::DevMemError>(())
//! ```
//!
//! ## Modules
//!
//! - [`errors`]: Error types for all region operations
//! - [`utils`]: Page size, alignment, and bounds helpers
//! - [`region`]: Core [`MappedRegion`] implementation
//! - [`manager`]: Convenience constructors

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/devmem-io")]

pub mod errors;
pub mod utils;
pub mod region;
pub mod manager;

pub use errors::{DevMemError, Result};
pub use manager::{open_page, open_region};
pub use region::{MappedRegion, RegionGeometry};
