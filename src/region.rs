//! Page-aligned mapped region with volatile typed accessors.

use std::{
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
    ptr,
};

use log::{debug, trace};
use memmap2::{MmapMut, MmapOptions};

use crate::errors::{DevMemError, Result};
use crate::utils::{align_down, checked_align_up, ensure_in_range, page_size};

/// Page-alignment parameters of a mapped region, computed once at open.
///
/// The OS mapping primitive requires a page-aligned file offset, so a user
/// request of `(user_offset, user_len)` is widened to the enclosing
/// page-aligned span and accesses are rebased by `offset_in_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionGeometry {
    /// `user_offset` rounded down to a page boundary; where the mapping starts.
    pub page_offset: u64,
    /// `user_offset - page_offset`; always in `[0, page_size)`.
    pub offset_in_page: u64,
    /// Span of the underlying mapping; a page multiple covering
    /// `offset_in_page + user_len` bytes.
    pub mapped_len: u64,
}

impl RegionGeometry {
    /// Compute the page-aligned mapping parameters for a user request.
    ///
    /// Returns `None` if `mapped_len` would not fit in a `u64`, i.e. no
    /// mapping can cover the requested span.
    #[must_use]
    pub fn compute(user_offset: u64, user_len: u64, page_size: u64) -> Option<Self> {
        let page_offset = align_down(user_offset, page_size);
        let offset_in_page = user_offset - page_offset;
        let mapped_len = checked_align_up(offset_in_page.checked_add(user_len)?, page_size)?;
        Some(Self {
            page_offset,
            offset_in_page,
            mapped_len,
        })
    }
}

/// A shared read/write memory mapping of a byte region of a file, typically a
/// physical-memory or MMIO device node such as `/dev/mem`.
///
/// The region is addressed by byte positions relative to the requested
/// `user_offset`; the page-alignment arithmetic demanded by the OS mapping
/// primitive is internal. All typed accessors are bounds-checked against the
/// user-visible length and performed as single volatile loads/stores, so they
/// are never elided, reordered, or widened — required when the mapping backs
/// live device registers rather than ordinary memory.
///
/// Multi-byte accesses must be naturally aligned with respect to the absolute
/// address (`(user_offset + pos) % width == 0`); misaligned requests fail
/// with [`DevMemError::Misaligned`] instead of splitting the access.
///
/// Values are read and written in host-native byte order; no conversion is
/// performed.
///
/// The region exclusively owns its OS mapping. It is unmapped exactly once,
/// when the region is dropped (or consumed by [`MappedRegion::close`]). The
/// region performs no internal synchronization; concurrent access from
/// multiple threads must be serialized by the caller.
///
/// # Examples
///
/// ```no_run
/// use devmem_io::MappedRegion;
///
/// // Map 64 bytes of a device register block at physical offset 0xFE20_0000.
/// let mut gpio = MappedRegion::open("/dev/mem", 0xFE20_0000, 64)?;
///
/// let level = gpio.read_u32(0x34)?;
/// gpio.write_u32(0x1C, level | 1 << 4)?;
/// # Ok::<(), devmem_io::DevMemError>(())
/// ```
pub struct MappedRegion {
    path: PathBuf,
    map: MmapMut,
    user_offset: u64,
    len: u64,
    offset_in_page: usize,
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("path", &self.path)
            .field("user_offset", &self.user_offset)
            .field("len", &self.len)
            .field("mapped_len", &self.map.len())
            .finish()
    }
}

impl MappedRegion {
    /// Open `path` read/write and map `len` bytes starting at byte `offset`.
    ///
    /// `len == 0` requests one page. The mapping itself is widened to the
    /// enclosing page-aligned span (see [`RegionGeometry`]); only the
    /// requested `len` bytes are accessible through the typed accessors.
    ///
    /// The file handle is released as soon as the mapping is established; the
    /// mapping keeps the backing store referenced. On unix the file is opened
    /// with `O_SYNC`, matching the access discipline expected of device nodes.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::Open` if the path is missing or lacks read/write
    /// permission, and `DevMemError::Map` if no mapping can cover the request
    /// (the page-aligned span overflows) or the OS mapping primitive fails
    /// (unsupported device, insufficient address space). Both preserve the
    /// underlying OS error. A failed open retains no resources.
    #[allow(clippy::cast_possible_truncation)]
    pub fn open<P: AsRef<Path>>(path: P, offset: u64, len: u64) -> Result<Self> {
        let path_ref = path.as_ref();
        let page = page_size() as u64;
        let len = if len == 0 { page } else { len };
        let geom =
            RegionGeometry::compute(offset, len, page).ok_or_else(|| DevMemError::Map {
                path: path_ref.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "offset and length overflow the page-aligned span",
                ),
            })?;

        let mut opts = OpenOptions::new();
        opts.read(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.custom_flags(libc::O_SYNC);
        }
        let file = opts.open(path_ref).map_err(|e| DevMemError::Open {
            path: path_ref.to_path_buf(),
            source: e,
        })?;

        debug!(
            "mapping {}: off: {:#x} (pg_off: {:#x}), len: {:#x} (pg_len: {:#x})",
            path_ref.display(),
            offset,
            geom.offset_in_page,
            len,
            geom.mapped_len,
        );

        // SAFETY: the offset is page-aligned and the length a page multiple by
        // construction; memmap2 handles the platform-specific mapping details.
        let map = unsafe {
            MmapOptions::new()
                .offset(geom.page_offset)
                .len(geom.mapped_len as usize)
                .map_mut(&file)
        }
        .map_err(|e| DevMemError::Map {
            path: path_ref.to_path_buf(),
            source: e,
        })?;

        // `file` drops here; the mapping outlives the descriptor.
        Ok(Self {
            path: path_ref.to_path_buf(),
            map,
            user_offset: offset,
            len,
            offset_in_page: geom.offset_in_page as usize,
        })
    }

    /// Path of the backing file, retained for diagnostics.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Requested starting byte offset within the backing file.
    #[must_use]
    pub fn user_offset(&self) -> u64 {
        self.user_offset
    }

    /// User-visible length in bytes; the bound enforced on all accesses.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the user-visible region is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Page-aligned file offset where the underlying mapping starts.
    #[must_use]
    pub fn page_offset(&self) -> u64 {
        self.user_offset - self.offset_in_page as u64
    }

    /// Offset of the region start within its first mapped page.
    #[must_use]
    pub fn offset_in_page(&self) -> u64 {
        self.offset_in_page as u64
    }

    /// Span of the underlying mapping in bytes; always a page multiple.
    #[must_use]
    pub fn mapped_len(&self) -> u64 {
        self.map.len() as u64
    }

    /// Absolute numeric address of byte `pos` within the region, for
    /// diagnostic or interop use.
    ///
    /// No bounds check is performed; callers needing safety must check
    /// against [`len`](Self::len) themselves or go through the checked
    /// accessors.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn address_of(&self, pos: u64) -> usize {
        self.map.as_ptr() as usize + self.offset_in_page + pos as usize
    }

    /// Human-readable summary: path, base address, offsets and lengths.
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Validate bounds and natural alignment for an access of `size` bytes.
    fn check_access(&self, pos: u64, size: u64) -> Result<()> {
        ensure_in_range(pos, size, self.len)?;
        if size > 1 && (self.offset_in_page as u64 + pos) % size != 0 {
            return Err(DevMemError::Misaligned {
                pos,
                required: size,
            });
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn load<T: Copy>(&self, pos: u64) -> Result<T> {
        self.check_access(pos, std::mem::size_of::<T>() as u64)?;
        // SAFETY: bounds and alignment were just validated, and the pointer
        // stays within the mapping, which lives as long as `self`.
        Ok(unsafe {
            let addr = self.map.as_ptr().add(self.offset_in_page + pos as usize);
            ptr::read_volatile(addr.cast::<T>())
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn store<T: Copy>(&mut self, pos: u64, value: T) -> Result<()> {
        self.check_access(pos, std::mem::size_of::<T>() as u64)?;
        // SAFETY: same invariants as `load`; the mapping is writable and
        // `&mut self` gives exclusive access on the Rust side.
        unsafe {
            let addr = self
                .map
                .as_mut_ptr()
                .add(self.offset_in_page + pos as usize);
            ptr::write_volatile(addr.cast::<T>(), value);
        }
        Ok(())
    }

    /// Volatile 8-bit load at byte position `pos`.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::OutOfRange` if `pos + 1` exceeds the region length.
    pub fn read_u8(&self, pos: u64) -> Result<u8> {
        self.load(pos)
    }

    /// Volatile 16-bit load at byte position `pos`, host byte order.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::OutOfRange` if `pos + 2` exceeds the region length.
    /// Returns `DevMemError::Misaligned` if the absolute address is not 2-byte aligned.
    pub fn read_u16(&self, pos: u64) -> Result<u16> {
        self.load(pos)
    }

    /// Volatile 32-bit load at byte position `pos`, host byte order.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::OutOfRange` if `pos + 4` exceeds the region length.
    /// Returns `DevMemError::Misaligned` if the absolute address is not 4-byte aligned.
    pub fn read_u32(&self, pos: u64) -> Result<u32> {
        self.load(pos)
    }

    /// Volatile 64-bit load at byte position `pos`, host byte order.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::OutOfRange` if `pos + 8` exceeds the region length.
    /// Returns `DevMemError::Misaligned` if the absolute address is not 8-byte aligned.
    pub fn read_u64(&self, pos: u64) -> Result<u64> {
        self.load(pos)
    }

    /// Volatile 8-bit store at byte position `pos`.
    ///
    /// Immediately visible to anything else mapping the same backing store.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::OutOfRange` if `pos + 1` exceeds the region length.
    pub fn write_u8(&mut self, pos: u64, value: u8) -> Result<()> {
        self.store(pos, value)
    }

    /// Volatile 16-bit store at byte position `pos`, host byte order.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::OutOfRange` if `pos + 2` exceeds the region length.
    /// Returns `DevMemError::Misaligned` if the absolute address is not 2-byte aligned.
    pub fn write_u16(&mut self, pos: u64, value: u16) -> Result<()> {
        self.store(pos, value)
    }

    /// Volatile 32-bit store at byte position `pos`, host byte order.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::OutOfRange` if `pos + 4` exceeds the region length.
    /// Returns `DevMemError::Misaligned` if the absolute address is not 4-byte aligned.
    pub fn write_u32(&mut self, pos: u64, value: u32) -> Result<()> {
        self.store(pos, value)
    }

    /// Volatile 64-bit store at byte position `pos`, host byte order.
    ///
    /// # Errors
    ///
    /// Returns `DevMemError::OutOfRange` if `pos + 8` exceeds the region length.
    /// Returns `DevMemError::Misaligned` if the absolute address is not 8-byte aligned.
    pub fn write_u64(&mut self, pos: u64, value: u64) -> Result<()> {
        self.store(pos, value)
    }

    /// Explicitly tear the region down, unmapping it.
    ///
    /// Consuming the region makes a second close unrepresentable; dropping the
    /// region has the same effect, so scoped use needs no explicit call.
    pub fn close(self) {
        drop(self);
    }
}

impl std::fmt::Display for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mapped {} at {:#x}, off: {:#x} (pg_off: {:#x}), len: {:#x} (pg_len: {:#x})",
            self.path.display(),
            self.map.as_ptr() as usize,
            self.user_offset,
            self.offset_in_page,
            self.len,
            self.map.len(),
        )
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // MmapMut unmaps when dropped; this is the single teardown point.
        trace!("unmapping {}", self.path.display());
    }
}
