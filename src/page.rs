//! OS page mapping.
//!
//! Every component in this crate draws its backing memory from here rather
//! than from the process heap. Each call reaches the OS directly; there is no
//! page cache and no reuse. Regions come back read/write, private to the
//! process, and zero-initialized on first touch.

use core::ptr::NonNull;

use crate::stats::METRICS;

/// Granularity of all region requests.
pub const PAGE_SIZE: usize = 4096;

/// Rounds `value` up to the nearest multiple of `align` (a power of two).
pub const fn align_up(value: usize, align: usize) -> usize {
    if align == 0 {
        value
    } else {
        (value + (align - 1)) & !(align - 1)
    }
}

/// Maps a read/write anonymous region of at least `size` bytes.
///
/// The request is rounded up to [`PAGE_SIZE`]. Returns `None` for a zero
/// size, a size that cannot be rounded, or an OS refusal.
pub(crate) unsafe fn map_region(size: usize) -> Option<NonNull<u8>> {
    if size == 0 || size > usize::MAX - (PAGE_SIZE - 1) {
        return None;
    }
    let size = align_up(size, PAGE_SIZE);
    let region = os::map(size)?;
    METRICS.on_map(size);
    Some(region)
}

/// Returns a region obtained from [`map_region`] to the OS.
///
/// Null pointers and zero sizes are ignored; `size` is rounded the same way
/// the mapping call rounded it.
pub(crate) unsafe fn unmap_region(ptr: *mut u8, size: usize) {
    if ptr.is_null() || size == 0 {
        return;
    }
    let size = align_up(size, PAGE_SIZE);
    os::unmap(ptr, size);
    METRICS.on_unmap(size);
}

#[cfg(unix)]
mod os {
    use core::ptr::{self, NonNull};

    pub unsafe fn map(size: usize) -> Option<NonNull<u8>> {
        let ptr = libc::mmap(
            ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANON,
            -1,
            0,
        );
        if ptr == libc::MAP_FAILED {
            None
        } else {
            NonNull::new(ptr.cast::<u8>())
        }
    }

    pub unsafe fn unmap(ptr: *mut u8, size: usize) {
        libc::munmap(ptr.cast::<libc::c_void>(), size);
    }
}

#[cfg(windows)]
mod os {
    use core::ptr::{self, NonNull};
    use windows_sys::Win32::System::Memory::{
        VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
    };

    pub unsafe fn map(size: usize) -> Option<NonNull<u8>> {
        let ptr = VirtualAlloc(ptr::null_mut(), size, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE);
        NonNull::new(ptr.cast::<u8>())
    }

    pub unsafe fn unmap(ptr: *mut u8, _size: usize) {
        // MEM_RELEASE frees the whole reservation; the size must be 0.
        VirtualFree(ptr.cast(), 0, MEM_RELEASE);
    }
}
