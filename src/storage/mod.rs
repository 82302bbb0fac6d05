//! # Storage Module
//!
//! The storage layer of the engine core: page identity, the shared page
//! header with its latch-free version word, snapshot page images, and the
//! metadata registry that tracks every live storage.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │       StorageRegistry (id → handle)       │
//! ├─────────────────────┬─────────────────────┤
//! │  ArrayStorage       │  SequentialStorage  │   one handle per storage
//! ├─────────────────────┴─────────────────────┤
//! │   StorageMetadata (tagged, JSON-persisted)│
//! ├───────────────────────────────────────────┤
//! │   Page = PageHeader (32B) + payload       │   4KB, type-erased
//! │   PageHeader ⊃ PageVersion (atomic u64)   │   optimistic CC per page
//! ├───────────────────────────────────────────┤
//! │   PagePointer: volatile (node, offset)    │
//! │              | snapshot (opaque disk id)  │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Every live page is shared by all worker threads; the only intra-page
//! synchronization primitive is the version word in its header. Pages reach
//! this module as borrowed memory from the buffer pools; nothing here does
//! disk I/O — snapshot images are sealed into and verified from
//! caller-provided buffers.
//!
//! ## Module Organization
//!
//! - `page`: page/header layout, the version word, page initializers
//! - `pointer`: volatile and snapshot page pointers
//! - `snapshot`: on-disk page images, checksums
//! - `metadata`: per-storage descriptors and their persistence
//! - `registry`: id → storage mapping with factory dispatch
//! - `array`, `sequential`: the concrete storage kinds the core ships

pub mod array;
pub mod metadata;
pub mod page;
pub mod pointer;
pub mod registry;
pub mod sequential;
pub mod snapshot;

pub use array::{ArrayStorage, ArrayStorageFactory};
pub use metadata::{
    ArrayMetadata, MetadataDocument, SequentialMetadata, StorageMetadata, StorageName,
};
pub use page::{
    Page, PageHeader, PageType, PageVersion, PageVersionGuard, PageVersionValue,
    VolatilePageInitializer, NULL_PAGE_INITIALIZER,
};
pub use pointer::{SnapshotPagePointer, VolatilePagePointer};
pub use registry::{CreateContext, Storage, StorageFactory, StorageRegistry};
pub use sequential::{SequentialStorage, SequentialStorageFactory};
pub use snapshot::{
    compute_page_checksum, load_snapshot_page, seal_snapshot_page, verify_snapshot_page,
    SnapshotPageHeader,
};

/// Unique ID of a storage. 0 is reserved as "invalid".
pub type StorageId = u32;

/// 32-bit page-content checksum; meaningful only on snapshot pages.
pub type Checksum = u32;
