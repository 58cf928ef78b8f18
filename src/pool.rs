//! `Pool` — a fixed population of equal-sized blocks over one mapped region.
//!
//! Free blocks form an intrusive singly-linked list: the first word of each
//! free block holds the address of the next. One mutex serializes the list;
//! bounds data is immutable, so ownership checks never lock.

use core::mem::size_of;
use core::ptr::{self, NonNull};
use std::sync::Mutex;

use crate::page::{map_region, unmap_region};

/// Head of the intrusive free list plus the byte counter it implies.
struct FreeList {
    head: *mut u8,
    free_space: usize,
}

// The raw head pointer is only reached through the pool's mutex.
unsafe impl Send for FreeList {}

/// A fixed-size block pool.
///
/// Capacity is set at construction and never grows. An exhausted pool
/// returns `None` from `alloc`; that is a normal result, not an error.
///
/// If the backing region cannot be mapped (or the requested geometry is
/// degenerate: blocks narrower than a pointer, zero blocks, or a byte size
/// that overflows), the pool is valid but empty; `capacity()` is zero and
/// every `alloc` fails.
pub struct Pool {
    base: *mut u8,
    block_size: usize,
    block_count: usize,
    state: Mutex<FreeList>,
}

unsafe impl Send for Pool {}
unsafe impl Sync for Pool {}

impl Pool {
    /// Maps a region of `block_size * block_count` bytes and threads the
    /// free list through every block in ascending address order.
    pub fn new(block_size: usize, block_count: usize) -> Self {
        if block_size < size_of::<usize>() {
            return Self::empty(block_size);
        }
        let Some(total) = block_size.checked_mul(block_count) else {
            return Self::empty(block_size);
        };
        let Some(base) = (unsafe { map_region(total) }) else {
            return Self::empty(block_size);
        };
        let base = base.as_ptr();
        let head = unsafe { thread_free_list(base, block_size, block_count) };
        Self {
            base,
            block_size,
            block_count,
            state: Mutex::new(FreeList { head, free_space: total }),
        }
    }

    fn empty(block_size: usize) -> Self {
        Self {
            base: ptr::null_mut(),
            block_size,
            block_count: 0,
            state: Mutex::new(FreeList { head: ptr::null_mut(), free_space: 0 }),
        }
    }

    /// Pops one block, or `None` when the pool is exhausted.
    pub fn alloc(&self) -> Option<NonNull<u8>> {
        let mut list = self.state.lock().unwrap();
        let block = list.head;
        if block.is_null() {
            return None;
        }
        unsafe {
            list.head = *block.cast::<*mut u8>();
        }
        list.free_space -= self.block_size;
        NonNull::new(block)
    }

    /// Pops up to `out.len()` blocks under one lock acquisition, writing
    /// them into `out`. Returns the number obtained.
    pub fn alloc_batch(&self, out: &mut [*mut u8]) -> usize {
        let mut list = self.state.lock().unwrap();
        let mut taken = 0;
        while taken < out.len() {
            let block = list.head;
            if block.is_null() {
                break;
            }
            unsafe {
                list.head = *block.cast::<*mut u8>();
            }
            out[taken] = block;
            taken += 1;
        }
        list.free_space -= taken * self.block_size;
        taken
    }

    /// Pushes `block` back onto the free list.
    ///
    /// # Safety
    /// `block` must have been returned by this pool's `alloc` and not freed
    /// since; the pool writes a link word through it.
    pub unsafe fn free(&self, block: NonNull<u8>) {
        let mut list = self.state.lock().unwrap();
        *block.as_ptr().cast::<*mut u8>() = list.head;
        list.head = block.as_ptr();
        list.free_space += self.block_size;
    }

    /// Pushes every block in `blocks` under one lock acquisition.
    ///
    /// # Safety
    /// Same contract as [`Pool::free`], for every element.
    pub unsafe fn free_batch(&self, blocks: &[*mut u8]) {
        if blocks.is_empty() {
            return;
        }
        let mut list = self.state.lock().unwrap();
        for &block in blocks {
            *block.cast::<*mut u8>() = list.head;
            list.head = block;
        }
        list.free_space += blocks.len() * self.block_size;
    }

    /// Rebuilds the free list over the whole region, ascending, and restores
    /// `free_space` to full capacity.
    ///
    /// Every outstanding block pointer is invalidated; callers must not use
    /// or free one afterwards.
    pub fn reset(&self) {
        if self.base.is_null() {
            return;
        }
        let mut list = self.state.lock().unwrap();
        list.head = unsafe { thread_free_list(self.base, self.block_size, self.block_count) };
        list.free_space = self.block_size * self.block_count;
    }

    /// Whether `ptr` falls inside this pool's block region.
    pub fn owns(&self, ptr: *const u8) -> bool {
        if self.base.is_null() {
            return false;
        }
        let addr = ptr as usize;
        let base = self.base as usize;
        addr >= base && addr < base + self.block_size * self.block_count
    }

    /// Bytes currently on the free list.
    pub fn free_space(&self) -> usize {
        self.state.lock().unwrap().free_space
    }

    /// Total bytes the pool manages.
    pub fn capacity(&self) -> usize {
        self.block_size * self.block_count
    }

    /// The size of each block in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The number of blocks the pool manages.
    pub fn block_count(&self) -> usize {
        self.block_count
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        unsafe {
            unmap_region(self.base, self.block_size * self.block_count);
        }
    }
}

/// Links every block into an ascending-address free list and returns the
/// head (the lowest block).
///
/// # Safety
/// `base` must point to a writable region of at least
/// `block_size * block_count` bytes with no live allocations in it.
unsafe fn thread_free_list(base: *mut u8, block_size: usize, block_count: usize) -> *mut u8 {
    if block_count == 0 {
        return ptr::null_mut();
    }
    for i in 0..block_count - 1 {
        let block = base.add(i * block_size);
        *block.cast::<*mut u8>() = base.add((i + 1) * block_size);
    }
    let last = base.add((block_count - 1) * block_size);
    *last.cast::<*mut u8>() = ptr::null_mut();
    base
}
