//! # Thread Identity
//!
//! Worker threads are pinned one per core and identified by where they sit
//! in the machine topology: the NUMA node (group) and the core index within
//! that node (local ordinal). The two compose into a single 16-bit global id
//! that is cheap to pass around and stable enough to persist in log records.
//!
//! ## Composition
//!
//! ```text
//! ThreadId (u16) = (group << 8) | local_ordinal
//!
//! 15            8 7             0
//! +--------------+--------------+
//! | group (NUMA) | local (core) |
//! +--------------+--------------+
//! ```
//!
//! Composition is bijective: decomposing a composed id always yields the
//! original pair. With one byte each, up to 256 NUMA nodes with 256 cores
//! per node are addressable.
//!
//! ## Wire Format
//!
//! When a thread id is persisted inside a log record it is written as the
//! 16-bit global id in little-endian byte order ([`ThreadId::to_wire`]).
//!
//! ## Timeouts
//!
//! [`TimeoutMicros`] is the crate-wide convention for waitable APIs:
//! negative means wait forever, zero means a single conditional attempt, and
//! a positive value is a budget in microseconds.

use std::fmt;

/// ID of a NUMA node. At most 256 nodes are assumed.
pub type ThreadGroupId = u8;

/// Core index within one NUMA node. Not unique across nodes.
pub type ThreadLocalOrdinal = u8;

/// Maximum possible NUMA node id.
pub const MAX_THREAD_GROUP_ID: ThreadGroupId = 0xFF;

/// Maximum possible core index within a node.
pub const MAX_THREAD_LOCAL_ORDINAL: ThreadLocalOrdinal = 0xFF;

/// Globally unique thread (core) id, unique across NUMA nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(u16);

impl ThreadId {
    /// Composes a global id from a NUMA node and a core index within it.
    #[inline]
    pub const fn new(group: ThreadGroupId, local: ThreadLocalOrdinal) -> Self {
        Self(((group as u16) << 8) | local as u16)
    }

    /// Reinterprets a raw 16-bit value as a thread id.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// The raw composed value.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Extracts the NUMA node this thread belongs to.
    #[inline]
    pub const fn group(self) -> ThreadGroupId {
        (self.0 >> 8) as u8
    }

    /// Extracts the core index within the NUMA node.
    #[inline]
    pub const fn local_ordinal(self) -> ThreadLocalOrdinal {
        (self.0 & 0xFF) as u8
    }

    /// Little-endian form used when the id is persisted in log records.
    #[inline]
    pub const fn to_wire(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    /// Reads an id back from its persisted little-endian form.
    #[inline]
    pub const fn from_wire(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.group(), self.local_ordinal())
    }
}

/// Timeout parameter (in microseconds) for waitable methods.
///
/// Negative means wait forever. Zero means no wait: the operation runs only
/// on the condition of immediate availability. Positive is a deadline
/// budget; if the method had to wait longer it gives up and reports failure.
pub type TimeoutMicros = i64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_matches_documented_layout() {
        assert_eq!(ThreadId::new(3, 17).raw(), 0x0311);
        assert_eq!(ThreadId::new(0, 0).raw(), 0);
        assert_eq!(ThreadId::new(0xFF, 0xFF).raw(), 0xFFFF);
    }

    #[test]
    fn decompose_recovers_both_parts() {
        let id = ThreadId::new(3, 17);
        assert_eq!(id.group(), 3);
        assert_eq!(id.local_ordinal(), 17);
    }

    #[test]
    fn roundtrip_is_bijective_over_full_domain() {
        for group in 0..=MAX_THREAD_GROUP_ID {
            for local in 0..=MAX_THREAD_LOCAL_ORDINAL {
                let id = ThreadId::new(group, local);
                assert_eq!(id.group(), group);
                assert_eq!(id.local_ordinal(), local);
                assert_eq!(ThreadId::from_raw(id.raw()), id);
            }
        }
    }

    #[test]
    fn wire_format_is_little_endian() {
        let id = ThreadId::new(0x12, 0x34);
        assert_eq!(id.to_wire(), [0x34, 0x12]);
        assert_eq!(ThreadId::from_wire([0x34, 0x12]), id);
    }

    #[test]
    fn display_shows_group_and_ordinal() {
        assert_eq!(ThreadId::new(2, 40).to_string(), "2-40");
    }
}
