//! # Page Allocation Seam
//!
//! Volatile pages are owned by per-NUMA-node buffer pools that live outside
//! this core. The core only needs one capability from them: hand me a
//! zeroed page on a given node, together with the pointer that identifies
//! it. [`PagePool`] is that seam.
//!
//! [`HeapPagePool`] is the in-crate implementation backing tests and tools:
//! plain heap allocations with per-node monotonically increasing offsets.
//! It honors the pointer contract (offset 0 is never handed out) and an
//! optional per-node capacity so exhaustion paths are testable, but it does
//! no NUMA placement — that is the production pool's job.

use crate::storage::{Page, VolatilePagePointer};
use crate::thread::ThreadGroupId;
use eyre::{ensure, Result};
use hashbrown::HashMap;
use parking_lot::Mutex;

/// A freshly allocated volatile page and the pointer that identifies it.
pub struct PageAllocation {
    pub pointer: VolatilePagePointer,
    pub page: Box<Page>,
}

/// The buffer pool capability the core consumes.
pub trait PagePool: Send + Sync {
    /// Allocates a zeroed page from `numa_node`'s pool.
    fn allocate(&self, numa_node: ThreadGroupId) -> Result<PageAllocation>;
}

/// Heap-backed pool for tests and tools.
pub struct HeapPagePool {
    capacity_per_node: u32,
    next_offsets: Mutex<HashMap<ThreadGroupId, u32>>,
}

impl HeapPagePool {
    /// A pool with effectively unbounded capacity.
    pub fn new() -> Self {
        Self::with_capacity(u32::MAX)
    }

    /// A pool that refuses to hand out more than `capacity_per_node` pages
    /// per NUMA node.
    pub fn with_capacity(capacity_per_node: u32) -> Self {
        Self {
            capacity_per_node,
            next_offsets: Mutex::new(HashMap::new()),
        }
    }

    /// Pages handed out so far for `numa_node`.
    pub fn allocated(&self, numa_node: ThreadGroupId) -> u32 {
        self.next_offsets
            .lock()
            .get(&numa_node)
            .map(|next| next - 1)
            .unwrap_or(0)
    }
}

impl Default for HeapPagePool {
    fn default() -> Self {
        Self::new()
    }
}

impl PagePool for HeapPagePool {
    fn allocate(&self, numa_node: ThreadGroupId) -> Result<PageAllocation> {
        let offset = {
            let mut offsets = self.next_offsets.lock();
            // Offset 0 is the null pointer, so numbering starts at 1.
            let next = offsets.entry(numa_node).or_insert(1);
            ensure!(
                *next <= self.capacity_per_node,
                "page pool exhausted on node {}: capacity {}",
                numa_node,
                self.capacity_per_node
            );
            let offset = *next;
            *next += 1;
            offset
        };

        Ok(PageAllocation {
            pointer: VolatilePagePointer::new(numa_node, offset),
            page: Page::new_boxed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_start_at_one_and_increase() {
        let pool = HeapPagePool::new();
        let a = pool.allocate(0).unwrap();
        let b = pool.allocate(0).unwrap();

        assert_eq!(a.pointer.offset(), 1);
        assert_eq!(b.pointer.offset(), 2);
        assert!(!a.pointer.is_null());
    }

    #[test]
    fn nodes_have_independent_offset_spaces() {
        let pool = HeapPagePool::new();
        let a = pool.allocate(0).unwrap();
        let b = pool.allocate(3).unwrap();

        assert_eq!(a.pointer.offset(), 1);
        assert_eq!(b.pointer.offset(), 1);
        assert_eq!(b.pointer.numa_node(), 3);
        assert_ne!(a.pointer, b.pointer);
    }

    #[test]
    fn allocated_pages_are_zeroed() {
        let pool = HeapPagePool::new();
        let allocation = pool.allocate(1).unwrap();
        assert!(allocation.page.payload().iter().all(|&b| b == 0));
        assert_eq!(allocation.page.header().page_version().value().data(), 0);
    }

    #[test]
    fn capacity_is_enforced_per_node() {
        let pool = HeapPagePool::with_capacity(2);
        pool.allocate(0).unwrap();
        pool.allocate(0).unwrap();
        assert!(pool.allocate(0).is_err());
        // Another node is unaffected.
        assert!(pool.allocate(1).is_ok());
    }

    #[test]
    fn allocated_counts_per_node() {
        let pool = HeapPagePool::new();
        assert_eq!(pool.allocated(0), 0);
        pool.allocate(0).unwrap();
        pool.allocate(0).unwrap();
        assert_eq!(pool.allocated(0), 2);
        assert_eq!(pool.allocated(1), 0);
    }
}
