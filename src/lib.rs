//! # pactdb — NUMA-aware transactional storage engine core
//!
//! pactdb is the in-memory nucleus of a serializable, NUMA-conscious
//! database engine: the per-page concurrency control protocol and the page
//! identity model every storage structure above it threads through.
//!
//! Correctness hinges on a single 64-bit atomic word per page that
//! simultaneously encodes a lock bit, structural-modification flags,
//! monotone version counters, and mutable physical state. Readers validate
//! optimistically around that word; writers serialize through its lock bit
//! and publish with a carefully ordered counter bump.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     Storage kinds (array, sequential)    │
//! ├─────────────────────────────────────────┤
//! │  StorageRegistry │ StorageMetadata (JSON)│
//! ├──────────────────┴──────────────────────┤
//! │  Page / PageHeader / PageVersion         │
//! │  optimistic reads · per-page spinlock    │
//! ├─────────────────────────────────────────┤
//! │  PagePointers · snapshot images (CRC32C) │
//! ├─────────────────────────────────────────┤
//! │  seams: PagePool · LogBuffer (external)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! One pinned worker thread per core, identified by
//! [`ThreadId`](thread::ThreadId) = (NUMA node, local ordinal). Pages are
//! shared across all workers; the engine is lock-free between pages and
//! uses the per-page spinlock encoded in
//! [`PageVersion`](storage::PageVersion) within one. Readers follow the
//! optimistic protocol documented in [`storage::page`]; writers hold the
//! lock only for bounded work.
//!
//! ## Module Overview
//!
//! - [`storage`]: pages, the version word, pointers, snapshots, metadata,
//!   and the registry
//! - [`memory`]: the buffer-pool allocation seam
//! - [`log`]: create-log records and the log-buffer seam
//! - [`thread`]: thread identity and timeout conventions
//! - [`epoch`]: coarse logical time
//! - [`error`]: the stable error taxonomy
//! - [`config`]: compile-time constants

#[macro_use]
mod macros;

pub mod config;
pub mod epoch;
pub mod error;
pub mod log;
pub mod memory;
pub mod storage;
pub mod thread;

pub use epoch::Epoch;
pub use error::StorageError;
pub use storage::{
    Page, PageHeader, PageType, PageVersion, PageVersionGuard, PageVersionValue,
    SnapshotPagePointer, StorageId, StorageMetadata, StorageRegistry, VolatilePagePointer,
};
pub use thread::{ThreadId, TimeoutMicros};
