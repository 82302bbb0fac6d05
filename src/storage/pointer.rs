//! # Page Pointers
//!
//! Every page pointer is a single 64-bit word, but the word means different
//! things depending on where the page lives:
//!
//! - A **volatile** page sits in a NUMA-local buffer pool and is addressed
//!   by (numa_node, pool offset).
//! - A **snapshot** page is immutable on disk and addressed by an opaque
//!   64-bit id minted by the snapshot writer.
//!
//! The page header stores the raw word; the `snapshot` flag next to it says
//! which interpretation applies.
//!
//! ## Volatile Pointer Layout
//!
//! ```text
//! Bits    Field      Description
//! ------  ---------  -------------------------------------------
//! 0-7     numa_node  Which node's pool owns the page
//! 8-15    flags      Tagging header for pointer-swap protocols
//! 16-31   mod_count  ABA counter for pointer-swap protocols
//! 32-63   offset     Page slot within the node's pool; 0 is null
//! ```
//!
//! Only (numa_node, offset) identify a page. `flags` and `mod_count` belong
//! to the installation protocol of whoever swings the pointer, so equality
//! and hashing ignore them.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque id of an immutable on-disk page. 0 means null.
pub type SnapshotPagePointer = u64;

const NUMA_NODE_MASK: u64 = 0x0000_0000_0000_00FF;
const FLAGS_SHIFT: u32 = 8;
const FLAGS_MASK: u64 = 0x0000_0000_0000_FF00;
const MOD_COUNT_SHIFT: u32 = 16;
const MOD_COUNT_MASK: u64 = 0x0000_0000_FFFF_0000;
const OFFSET_SHIFT: u32 = 32;

/// Pointer to an in-memory page in some node's buffer pool.
#[derive(Debug, Clone, Copy)]
pub struct VolatilePagePointer {
    word: u64,
}

impl VolatilePagePointer {
    /// The null pointer: offset 0 on node 0.
    pub const NULL: VolatilePagePointer = VolatilePagePointer { word: 0 };

    /// Builds a pointer with a zero tagging header.
    #[inline]
    pub const fn new(numa_node: u8, offset: u32) -> Self {
        Self {
            word: numa_node as u64 | ((offset as u64) << OFFSET_SHIFT),
        }
    }

    /// Builds a pointer including the tagging header fields.
    #[inline]
    pub const fn with_header(numa_node: u8, flags: u8, mod_count: u16, offset: u32) -> Self {
        Self {
            word: numa_node as u64
                | ((flags as u64) << FLAGS_SHIFT)
                | ((mod_count as u64) << MOD_COUNT_SHIFT)
                | ((offset as u64) << OFFSET_SHIFT),
        }
    }

    /// Reinterprets a raw word, e.g. one read back from a page header.
    #[inline]
    pub const fn from_word(word: u64) -> Self {
        Self { word }
    }

    #[inline]
    pub const fn word(self) -> u64 {
        self.word
    }

    #[inline]
    pub const fn numa_node(self) -> u8 {
        (self.word & NUMA_NODE_MASK) as u8
    }

    #[inline]
    pub const fn flags(self) -> u8 {
        ((self.word & FLAGS_MASK) >> FLAGS_SHIFT) as u8
    }

    #[inline]
    pub const fn mod_count(self) -> u16 {
        ((self.word & MOD_COUNT_MASK) >> MOD_COUNT_SHIFT) as u16
    }

    #[inline]
    pub const fn offset(self) -> u32 {
        (self.word >> OFFSET_SHIFT) as u32
    }

    /// A pointer with offset 0 points at no page.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.offset() == 0
    }
}

impl PartialEq for VolatilePagePointer {
    /// Identity is (numa_node, offset); the tagging header does not count.
    fn eq(&self, other: &Self) -> bool {
        self.numa_node() == other.numa_node() && self.offset() == other.offset()
    }
}

impl Eq for VolatilePagePointer {}

impl Hash for VolatilePagePointer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numa_node().hash(state);
        self.offset().hash(state);
    }
}

impl fmt::Display for VolatilePagePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vol[node={}, offset={:#x}]", self.numa_node(), self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack_all_fields() {
        let p = VolatilePagePointer::with_header(3, 0xAB, 0x1234, 0xDEAD_BEEF);
        assert_eq!(p.numa_node(), 3);
        assert_eq!(p.flags(), 0xAB);
        assert_eq!(p.mod_count(), 0x1234);
        assert_eq!(p.offset(), 0xDEAD_BEEF);
    }

    #[test]
    fn new_leaves_header_zero() {
        let p = VolatilePagePointer::new(7, 42);
        assert_eq!(p.flags(), 0);
        assert_eq!(p.mod_count(), 0);
        assert_eq!(p.numa_node(), 7);
        assert_eq!(p.offset(), 42);
    }

    #[test]
    fn word_roundtrip() {
        let p = VolatilePagePointer::with_header(1, 2, 3, 4);
        assert_eq!(VolatilePagePointer::from_word(p.word()), p);
    }

    #[test]
    fn identity_ignores_tagging_header() {
        let a = VolatilePagePointer::with_header(1, 0x00, 0, 99);
        let b = VolatilePagePointer::with_header(1, 0xFF, 77, 99);
        assert_eq!(a, b);

        let c = VolatilePagePointer::new(2, 99);
        assert_ne!(a, c);
    }

    #[test]
    fn null_means_zero_offset() {
        assert!(VolatilePagePointer::NULL.is_null());
        assert!(VolatilePagePointer::new(5, 0).is_null());
        assert!(!VolatilePagePointer::new(0, 1).is_null());
    }
}
