//! Utility helpers for page size, alignment, and bounds checking.

use crate::errors::{DevMemError, Result};

/// Get the system page size in bytes.
#[must_use]
pub fn page_size() -> usize {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "windows")] {
            windows_page_size()
        } else {
            unix_page_size()
        }
    }
}

#[cfg(target_os = "windows")]
fn windows_page_size() -> usize {
    use std::mem::MaybeUninit;
    #[allow(non_snake_case)]
    #[repr(C)]
    struct SYSTEM_INFO {
        wProcessorArchitecture: u16,
        wReserved: u16,
        dwPageSize: u32,
        lpMinimumApplicationAddress: *mut core::ffi::c_void,
        lpMaximumApplicationAddress: *mut core::ffi::c_void,
        dwActiveProcessorMask: usize,
        dwNumberOfProcessors: u32,
        dwProcessorType: u32,
        dwAllocationGranularity: u32,
        wProcessorLevel: u16,
        wProcessorRevision: u16,
    }
    extern "system" {
        fn GetSystemInfo(lpSystemInfo: *mut SYSTEM_INFO);
    }
    let mut sysinfo = MaybeUninit::<SYSTEM_INFO>::uninit();
    unsafe {
        GetSystemInfo(sysinfo.as_mut_ptr());
        let s = sysinfo.assume_init();
        s.dwPageSize as usize
    }
}

#[cfg(not(target_os = "windows"))]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unix_page_size() -> usize {
    // SAFETY: sysconf with _SC_PAGESIZE is safe to call.
    unsafe {
        let page_size = libc::sysconf(libc::_SC_PAGESIZE);
        // Page size is always positive and fits in usize.
        page_size.max(0) as usize
    }
}

/// Align a value up to the nearest multiple of `alignment`.
#[must_use]
pub fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    // Fast path for power-of-2 alignments (the common case for page sizes)
    if alignment.is_power_of_two() {
        let mask = alignment - 1;
        (value + mask) & !mask
    } else {
        value.div_ceil(alignment) * alignment
    }
}

/// Align a value up to the nearest multiple of `alignment`, returning `None`
/// if the aligned value does not fit in a `u64`.
#[must_use]
pub fn checked_align_up(value: u64, alignment: u64) -> Option<u64> {
    if alignment == 0 {
        return Some(value);
    }
    if alignment.is_power_of_two() {
        let mask = alignment - 1;
        Some(value.checked_add(mask)? & !mask)
    } else {
        value.div_ceil(alignment).checked_mul(alignment)
    }
}

/// Align a value down to the nearest multiple of `alignment`.
#[must_use]
pub fn align_down(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    if alignment.is_power_of_two() {
        value & !(alignment - 1)
    } else {
        value - (value % alignment)
    }
}

/// Ensure the requested access of `size` bytes at `pos` lies within `[0, len)`.
/// Returns `Ok(())` if valid; otherwise an `OutOfRange` error.
///
/// # Errors
///
/// Returns `DevMemError::OutOfRange` if `pos + size` exceeds `len`.
pub fn ensure_in_range(pos: u64, size: u64, len: u64) -> Result<()> {
    let end = pos.saturating_add(size);
    if end > len {
        return Err(DevMemError::OutOfRange { pos, size, len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_sane() {
        let ps = page_size();
        assert!(ps >= 512);
        assert!(ps.is_power_of_two());
    }

    #[test]
    fn align_up_rounds_to_multiples() {
        assert_eq!(align_up(0, 4096), 0);
        assert_eq!(align_up(1, 4096), 4096);
        assert_eq!(align_up(4096, 4096), 4096);
        assert_eq!(align_up(4097, 4096), 8192);
        // Non power-of-2 alignment takes the slow path
        assert_eq!(align_up(10, 3), 12);
    }

    #[test]
    fn checked_align_up_detects_overflow() {
        assert_eq!(checked_align_up(10, 4096), Some(4096));
        assert_eq!(checked_align_up(4096, 4096), Some(4096));
        assert_eq!(checked_align_up(u64::MAX - 5, 4096), None);
        assert_eq!(checked_align_up(u64::MAX, 3), None);
    }

    #[test]
    fn align_down_rounds_to_multiples() {
        assert_eq!(align_down(0, 4096), 0);
        assert_eq!(align_down(100, 4096), 0);
        assert_eq!(align_down(4096, 4096), 4096);
        assert_eq!(align_down(8191, 4096), 4096);
        assert_eq!(align_down(10, 3), 9);
    }

    #[test]
    fn ensure_in_range_boundaries() {
        assert!(ensure_in_range(0, 4, 50).is_ok());
        assert!(ensure_in_range(46, 4, 50).is_ok());
        assert!(matches!(
            ensure_in_range(47, 4, 50),
            Err(DevMemError::OutOfRange {
                pos: 47,
                size: 4,
                len: 50
            })
        ));
        // Overflowing positions must not wrap around
        assert!(ensure_in_range(u64::MAX, 8, 50).is_err());
    }
}
