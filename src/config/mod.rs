//! # Engine Configuration Constants
//!
//! This module centralizes the compile-time constants of the storage core.
//! Constants that depend on each other are co-located and cross-checked with
//! compile-time assertions so a change to one cannot silently break another.
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_SIZE (4096 bytes)
//!       │
//!       ├─> PAGE_HEADER_SIZE (32 bytes, fixed prefix of every page)
//!       │     The header layout is pinned by the on-disk snapshot format;
//!       │     see storage::page and storage::snapshot.
//!       │
//!       └─> PAGE_PAYLOAD_SIZE (derived: PAGE_SIZE - PAGE_HEADER_SIZE)
//!             The type-specific region interpreted by each storage kind.
//!
//! MAX_STORAGE_NAME_LENGTH (64 bytes)
//!       │
//!       └─> StorageName stores its length in a single byte, so the
//!           capacity must stay below 256.
//!
//! MAX_STORAGES (512)
//!       └─> Upper bound enforced by StorageRegistry::create.
//! ```

/// Size of every page, volatile and snapshot alike.
pub const PAGE_SIZE: usize = 4096;

/// Size of the common [`PageHeader`](crate::storage::PageHeader) embedded at
/// offset 0 of every page.
pub const PAGE_HEADER_SIZE: usize = 32;

/// Bytes available to storage-specific code after the common header.
pub const PAGE_PAYLOAD_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE;

/// Maximum number of live storages in one engine.
pub const MAX_STORAGES: usize = 1 << 9;

/// Byte capacity of a storage name, stored inline without heap allocation.
pub const MAX_STORAGE_NAME_LENGTH: usize = 64;

const _: () = assert!(PAGE_SIZE.is_power_of_two());
const _: () = assert!(PAGE_HEADER_SIZE < PAGE_SIZE);
const _: () = assert!(PAGE_PAYLOAD_SIZE == PAGE_SIZE - PAGE_HEADER_SIZE);
const _: () = assert!(MAX_STORAGE_NAME_LENGTH < 256);
