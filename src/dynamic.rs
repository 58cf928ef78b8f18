//! `DynamicSlab` — unbounded growth over a list of slabs.
//!
//! Nodes are only ever prepended and never unlinked, so readers walk the
//! list lock-free: the head is loaded with acquire, and each node's `next`
//! is immutable after publication. A mutex serializes the rare growth path;
//! the double-check inside it keeps concurrent exhaustion from growing the
//! list more than once.

use core::mem::size_of;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::page::{map_region, unmap_region};
use crate::size_class::{index_to_size_class, size_to_index};
use crate::slab::Slab;

struct SlabNode {
    slab: Slab,
    // Set before publication, never written again.
    next: *mut SlabNode,
}

/// A slab allocator that grows by whole slabs instead of failing.
///
/// `palloc` walks the slab list and serves from the first slab with room;
/// when every slab is exhausted a new one is prepended. Capacity only ever
/// grows; no slab is released before the `DynamicSlab` itself drops.
///
/// # Destruction hazard
///
/// Dropping a `DynamicSlab` destroys every slab it grew. Thread caches held
/// by *other* threads still reference those slabs and cannot be reached from
/// the destructor; quiesce other threads or have them call
/// [`flush_thread_cache`](crate::flush_thread_cache) before dropping.
pub struct DynamicSlab {
    scale: f64,
    head: AtomicPtr<SlabNode>,
    node_count: AtomicUsize,
    grow_lock: Mutex<()>,
}

unsafe impl Send for DynamicSlab {}
unsafe impl Sync for DynamicSlab {}

impl DynamicSlab {
    /// Creates the wrapper with one slab of the given scale.
    ///
    /// If that first slab cannot be mapped the list starts empty and each
    /// subsequent `palloc` retries growth.
    pub fn new(scale: f64) -> Self {
        let dynamic = Self {
            scale,
            head: AtomicPtr::new(ptr::null_mut()),
            node_count: AtomicUsize::new(0),
            grow_lock: Mutex::new(()),
        };
        if let Some(node) = dynamic.create_node(ptr::null_mut()) {
            dynamic.head.store(node.as_ptr(), Ordering::Release);
            dynamic.node_count.store(1, Ordering::Relaxed);
        }
        dynamic
    }

    /// Maps and initializes a node whose `next` is `next`. Fails if the node
    /// region cannot be mapped or the contained slab comes up with zero
    /// capacity, since publishing a dead slab would make every exhausted
    /// `palloc` grow another one.
    fn create_node(&self, next: *mut SlabNode) -> Option<NonNull<SlabNode>> {
        let region = unsafe { map_region(size_of::<SlabNode>()) }?;
        let node = region.cast::<SlabNode>();
        let slab = Slab::new(self.scale);
        if slab.total_capacity() == 0 {
            drop(slab);
            unsafe {
                unmap_region(node.as_ptr().cast::<u8>(), size_of::<SlabNode>());
            }
            return None;
        }
        unsafe {
            node.as_ptr().write(SlabNode { slab, next });
        }
        Some(node)
    }

    fn walk_alloc(&self, size: usize) -> Option<NonNull<u8>> {
        let mut node = self.head.load(Ordering::Acquire);
        while !node.is_null() {
            let current = unsafe { &*node };
            if let Some(block) = current.slab.alloc(size) {
                return Some(block);
            }
            node = current.next;
        }
        None
    }

    /// Allocates `size` bytes, growing the slab list if every existing slab
    /// is exhausted.
    ///
    /// `None` only for invalid sizes (zero or above the largest class) or
    /// when a new slab cannot be mapped.
    pub fn palloc(&self, size: usize) -> Option<NonNull<u8>> {
        // Invalid requests never grow the list.
        size_to_index(size)?;

        if let Some(block) = self.walk_alloc(size) {
            return Some(block);
        }

        let _guard = self.grow_lock.lock().unwrap();

        // Another thread may have grown the list while we waited.
        if let Some(block) = self.walk_alloc(size) {
            return Some(block);
        }

        // The relaxed load is safe under the growth mutex: only this path
        // stores to head, and the release store below publishes the node.
        let node = self.create_node(self.head.load(Ordering::Relaxed))?;
        self.head.store(node.as_ptr(), Ordering::Release);
        self.node_count.fetch_add(1, Ordering::Relaxed);

        unsafe { node.as_ref() }.slab.alloc(size)
    }

    /// Allocates like [`DynamicSlab::palloc`] and zero-fills the entire
    /// class extent.
    pub fn calloc(&self, size: usize) -> Option<NonNull<u8>> {
        let index = size_to_index(size)?;
        let block = self.palloc(size)?;
        unsafe {
            ptr::write_bytes(block.as_ptr(), 0, index_to_size_class(index));
        }
        Some(block)
    }

    /// Routes `ptr` to the slab that owns it. A null `ptr`, an invalid
    /// `size`, or a pointer no slab claims is silently dropped.
    ///
    /// # Safety
    /// A non-null `ptr` inside one of this wrapper's slabs must have come
    /// from `palloc`/`calloc` with the same `size` (up to class rounding)
    /// and not have been freed since.
    pub unsafe fn free(&self, ptr: *mut u8, size: usize) {
        if ptr.is_null() || size_to_index(size).is_none() {
            return;
        }
        let mut node = self.head.load(Ordering::Acquire);
        while !node.is_null() {
            let current = &*node;
            if current.slab.owns(ptr) {
                current.slab.free(ptr, size);
                return;
            }
            node = current.next;
        }
    }

    /// Total bytes across every slab in the list.
    pub fn total_capacity(&self) -> usize {
        let mut total = 0;
        let mut node = self.head.load(Ordering::Acquire);
        while !node.is_null() {
            let current = unsafe { &*node };
            total += current.slab.total_capacity();
            node = current.next;
        }
        total
    }

    /// Free bytes across every slab in the list.
    pub fn total_free(&self) -> usize {
        let mut total = 0;
        let mut node = self.head.load(Ordering::Acquire);
        while !node.is_null() {
            let current = unsafe { &*node };
            total += current.slab.total_free();
            node = current.next;
        }
        total
    }

    /// Number of slabs in the list. Advisory: concurrent growth may race
    /// the read.
    pub fn slab_count(&self) -> usize {
        self.node_count.load(Ordering::Relaxed)
    }
}

impl Drop for DynamicSlab {
    fn drop(&mut self) {
        let mut node = self.head.load(Ordering::Acquire);
        while !node.is_null() {
            unsafe {
                let next = (*node).next;
                ptr::drop_in_place(node);
                unmap_region(node.cast::<u8>(), size_of::<SlabNode>());
                node = next;
            }
        }
    }
}
